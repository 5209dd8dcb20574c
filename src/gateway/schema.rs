/// Relational schema for process definitions
///
/// Every table keys on an opaque TEXT id. Text columns are NOT NULL with empty
/// defaults so rows always decode into their record shapes; list- and
/// object-valued fields are JSON text and listed in [`json_columns`].
use crate::gateway::Table;
use sqlx::sqlite::SqlitePool;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS model_types (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS models (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL DEFAULT '',
        tasks JSON NOT NULL DEFAULT '[]',
        system_message TEXT NOT NULL DEFAULT '',
        user_message TEXT NOT NULL DEFAULT '',
        temperature REAL NOT NULL DEFAULT 0.7,
        model_source_url TEXT NOT NULL DEFAULT '',
        context_window_size INTEGER NOT NULL DEFAULT 2048,
        usage_example TEXT NOT NULL DEFAULT '',
        api_key TEXT NOT NULL DEFAULT '',
        version TEXT NOT NULL DEFAULT '',
        author TEXT NOT NULL DEFAULT '',
        license TEXT NOT NULL DEFAULT '',
        fine_tuning_status TEXT NOT NULL DEFAULT 'Not fine-tuned',
        fine_tuning_dataset TEXT NOT NULL DEFAULT '',
        supported_languages JSON NOT NULL DEFAULT '[]',
        input_format JSON NOT NULL DEFAULT '[]',
        output_format JSON NOT NULL DEFAULT '[]',
        max_sequence_length INTEGER NOT NULL DEFAULT 512,
        batch_size INTEGER NOT NULL DEFAULT 1,
        quantization TEXT NOT NULL DEFAULT 'None',
        hardware_requirements JSON NOT NULL DEFAULT '[]',
        inference_time REAL NOT NULL DEFAULT 0,
        model_size REAL NOT NULL DEFAULT 0,
        inference_url TEXT NOT NULL DEFAULT '',
        max_tokens INTEGER NOT NULL DEFAULT 100,
        top_p REAL NOT NULL DEFAULT 1,
        pricing REAL NOT NULL DEFAULT 0,
        last_updated TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS agents (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        model_id TEXT,
        tool_ids JSON NOT NULL DEFAULT '[]',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tools (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        configuration TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS processes (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        graph_version INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        process_id TEXT REFERENCES processes(id) ON DELETE CASCADE,
        name TEXT NOT NULL DEFAULT '',
        input TEXT NOT NULL DEFAULT '',
        output TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS task_instances (
        id TEXT PRIMARY KEY,
        task_id TEXT NOT NULL DEFAULT '',
        agent_id TEXT NOT NULL DEFAULT '',
        process_id TEXT NOT NULL DEFAULT '',
        input TEXT NOT NULL DEFAULT '',
        output TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'pending',
        tool_ids JSON NOT NULL DEFAULT '[]',
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS process_tools (
        id TEXT PRIMARY KEY,
        process_id TEXT NOT NULL REFERENCES processes(id) ON DELETE CASCADE,
        tool_id TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS process_agents (
        id TEXT PRIMARY KEY,
        process_id TEXT NOT NULL REFERENCES processes(id) ON DELETE CASCADE,
        agent_id TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workflow_steps (
        id TEXT PRIMARY KEY,
        process_id TEXT NOT NULL REFERENCES processes(id) ON DELETE CASCADE,
        task_id TEXT NOT NULL,
        agent_id TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workflow_tools (
        id TEXT PRIMARY KEY,
        workflow_step_id TEXT NOT NULL REFERENCES workflow_steps(id) ON DELETE CASCADE,
        tool_id TEXT NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS secrets (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS configs (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        value JSON NOT NULL DEFAULT 'null'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS functions (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        language TEXT NOT NULL DEFAULT '',
        code TEXT NOT NULL DEFAULT ''
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tasks_process ON tasks(process_id)",
    "CREATE INDEX IF NOT EXISTS idx_process_tools_process ON process_tools(process_id)",
    "CREATE INDEX IF NOT EXISTS idx_process_agents_process ON process_agents(process_id)",
    "CREATE INDEX IF NOT EXISTS idx_workflow_steps_process ON workflow_steps(process_id)",
    "CREATE INDEX IF NOT EXISTS idx_workflow_tools_step ON workflow_tools(workflow_step_id)",
];

/// Create every table and index. Safe to call repeatedly.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for ddl in TABLES.iter().chain(INDEXES) {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

/// Columns stored as JSON text that decode back into arrays/objects
pub fn json_columns(table: Table) -> &'static [&'static str] {
    match table {
        Table::Models => &[
            "tasks",
            "supported_languages",
            "input_format",
            "output_format",
            "hardware_requirements",
        ],
        Table::Agents | Table::TaskInstances => &["tool_ids"],
        Table::Configs => &["value"],
        _ => &[],
    }
}
