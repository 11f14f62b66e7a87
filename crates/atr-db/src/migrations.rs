use atr_core::EngineResult;
use sqlx::SqlitePool;

/// Schema revisions, applied in order. Each entry is idempotent
/// (`CREATE TABLE IF NOT EXISTS`) so re-running against an already
/// migrated database is a no-op.
const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_0001), (2, MIGRATION_0002)];

const MIGRATION_0001: &str = r#"
CREATE TABLE IF NOT EXISTS committee (
    name TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    is_podling INTEGER NOT NULL DEFAULT 0,
    parent_committee_name TEXT REFERENCES committee(name),
    committee_members TEXT NOT NULL DEFAULT '[]',
    committers TEXT NOT NULL DEFAULT '[]',
    release_managers TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS release_policy (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_artifact_globs TEXT NOT NULL DEFAULT '["*.tar.gz","*.zip"]',
    binary_artifact_globs TEXT NOT NULL DEFAULT '[]',
    min_hours INTEGER,
    license_check_mode TEXT NOT NULL DEFAULT 'RAT',
    strict_checking BOOLEAN NOT NULL DEFAULT 0,
    mailto_addresses TEXT NOT NULL DEFAULT '[]',
    manual_vote BOOLEAN NOT NULL DEFAULT 0,
    pause_for_rm BOOLEAN NOT NULL DEFAULT 0,
    preserve_download_files BOOLEAN NOT NULL DEFAULT 0,
    github_repository_name TEXT,
    github_compose_workflow_path TEXT NOT NULL DEFAULT '[]',
    github_vote_workflow_path TEXT NOT NULL DEFAULT '[]',
    github_finish_workflow_path TEXT NOT NULL DEFAULT '[]',
    release_checklist TEXT,
    vote_template_override TEXT,
    announce_template_override TEXT
);

CREATE TABLE IF NOT EXISTS project (
    name TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    committee_name TEXT NOT NULL REFERENCES committee(name),
    status TEXT NOT NULL DEFAULT 'active',
    super_project_name TEXT REFERENCES project(name),
    categories TEXT NOT NULL DEFAULT '[]',
    languages TEXT NOT NULL DEFAULT '[]',
    release_policy_id INTEGER REFERENCES release_policy(id)
);

CREATE TABLE IF NOT EXISTS release (
    name TEXT PRIMARY KEY,
    project_name TEXT NOT NULL REFERENCES project(name),
    version TEXT NOT NULL,
    phase TEXT NOT NULL DEFAULT 'candidate_draft',
    created TEXT NOT NULL,
    released TEXT,
    release_policy_id INTEGER REFERENCES release_policy(id),
    vote_thread_id TEXT,
    vote_started TEXT,
    vote_duration_hours INTEGER,
    podling_thread_id TEXT,
    manual_vote BOOLEAN NOT NULL DEFAULT 0,
    UNIQUE (project_name, version)
);

CREATE TABLE IF NOT EXISTS revision_counter (
    release_name TEXT PRIMARY KEY REFERENCES release(name),
    last_allocated_number INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS revision (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_name TEXT NOT NULL REFERENCES release(name),
    seq INTEGER NOT NULL,
    number TEXT NOT NULL,
    asfuid TEXT NOT NULL,
    created TEXT NOT NULL,
    phase TEXT NOT NULL,
    parent_name TEXT,
    description TEXT,
    UNIQUE (release_name, number)
);

CREATE TABLE IF NOT EXISTS task (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    status TEXT NOT NULL DEFAULT 'queued',
    task_type TEXT NOT NULL,
    task_args TEXT NOT NULL DEFAULT '{}',
    asf_uid TEXT NOT NULL,
    added TEXT NOT NULL,
    scheduled TEXT,
    started TEXT,
    pid INTEGER,
    completed TEXT,
    result TEXT,
    error TEXT,
    project_name TEXT,
    version_name TEXT,
    revision_number TEXT,
    primary_rel_path TEXT
);

CREATE INDEX IF NOT EXISTS task_status_idx ON task(status);

CREATE TABLE IF NOT EXISTS check_result (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    release_name TEXT NOT NULL REFERENCES release(name),
    revision_number TEXT NOT NULL,
    checker TEXT NOT NULL,
    primary_rel_path TEXT,
    member_rel_path TEXT,
    created TEXT NOT NULL,
    status TEXT NOT NULL,
    message TEXT,
    data TEXT,
    input_hash TEXT
);

CREATE INDEX IF NOT EXISTS check_result_cache_idx
    ON check_result(checker, input_hash, primary_rel_path);

CREATE TABLE IF NOT EXISTS check_result_ignore (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    committee_name TEXT NOT NULL REFERENCES committee(name),
    release_glob TEXT NOT NULL,
    revision_number TEXT,
    checker_glob TEXT NOT NULL,
    primary_rel_path_glob TEXT NOT NULL,
    member_rel_path_glob TEXT NOT NULL,
    status TEXT NOT NULL,
    message_glob TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS public_signing_key (
    fingerprint TEXT PRIMARY KEY,
    algorithm TEXT NOT NULL,
    length INTEGER NOT NULL,
    created TEXT NOT NULL,
    expires TEXT,
    primary_declared_uid TEXT,
    secondary_declared_uids TEXT NOT NULL DEFAULT '[]',
    apache_uid TEXT,
    ascii_armored_key TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ssh_key (
    fingerprint TEXT PRIMARY KEY,
    key TEXT NOT NULL,
    asf_uid TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workflow_ssh_key (
    fingerprint TEXT PRIMARY KEY,
    key TEXT NOT NULL,
    project_name TEXT NOT NULL REFERENCES project(name),
    expires INTEGER NOT NULL,
    asf_uid TEXT NOT NULL,
    github_uid TEXT,
    github_nid INTEGER
);

CREATE TABLE IF NOT EXISTS personal_access_token (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    asf_uid TEXT NOT NULL,
    token_hash TEXT NOT NULL UNIQUE,
    label TEXT NOT NULL,
    created TEXT NOT NULL,
    expires TEXT,
    last_used TEXT
);

CREATE TABLE IF NOT EXISTS distribution (
    release_name TEXT NOT NULL REFERENCES release(name),
    platform TEXT NOT NULL,
    owner_namespace TEXT NOT NULL,
    package TEXT NOT NULL,
    version TEXT NOT NULL,
    staging BOOLEAN NOT NULL DEFAULT 0,
    upload_date TEXT NOT NULL,
    api_url TEXT NOT NULL,
    web_url TEXT NOT NULL,
    PRIMARY KEY (release_name, platform, owner_namespace, package, version)
);

CREATE TABLE IF NOT EXISTS text_value (
    ns TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (ns, key)
);
"#;

const MIGRATION_0002: &str = r#"
ALTER TABLE release ADD COLUMN path_suffix TEXT;
"#;

/// Applies every migration whose revision number is greater than the one
/// recorded in `schema_version`, in a single connection, in order. Safe to
/// call on every process startup.
pub async fn run_migrations(pool: &SqlitePool) -> EngineResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let current: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    let mut version = current.map(|(v,)| v).unwrap_or(0);

    for (revision, sql) in MIGRATIONS {
        if *revision <= version {
            continue;
        }
        let mut conn = pool.acquire().await?;
        sqlx::raw_sql(sql).execute(&mut *conn).await?;
        version = *revision;
    }

    sqlx::query(
        "INSERT INTO schema_version (id, version) VALUES (1, ?)
         ON CONFLICT (id) DO UPDATE SET version = excluded.version",
    )
    .bind(version)
    .execute(pool)
    .await?;

    Ok(())
}
