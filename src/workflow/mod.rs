/// Process authoring
///
/// The wizard and the canvas builder both edit a process graph in memory;
/// [`storage::ProcessStorage`] is the only part that writes it to the gateway.

pub mod builder;
pub mod canvas;
pub mod storage;
pub mod types;
pub mod wizard;

pub use builder::ProcessBuilder;
pub use canvas::{Canvas, CanvasEdge, CanvasNode, NodeKind, Position};
pub use storage::{ProcessStorage, SaveReport};
pub use types::{AgentRef, ProcessData, TaskRef, ToolRef, WorkflowStep};
pub use wizard::{ProcessWizard, WizardStep};
