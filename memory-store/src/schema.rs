//! SQL DDL for the memory store. Idempotent `CREATE ... IF NOT EXISTS`
//! statements, run once per process start by [`crate::LibsqlStore::migrate`].

pub const CREATE_MEMORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    detail TEXT NOT NULL,
    domain TEXT NOT NULL,
    pattern_type TEXT,
    source TEXT NOT NULL,
    source_section TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL,
    last_retrieved_at INTEGER NOT NULL,
    retrieval_count INTEGER NOT NULL DEFAULT 0,
    activation REAL NOT NULL DEFAULT 0.0,
    content_hash TEXT NOT NULL,
    embedding BLOB,
    status TEXT NOT NULL DEFAULT 'active',
    superseded_by TEXT REFERENCES memories(id),
    corrects TEXT REFERENCES memories(id)
)
"#;

pub const CREATE_MEMORIES_DOMAIN_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memories_domain ON memories(domain)";

pub const CREATE_MEMORIES_STATUS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memories_status ON memories(status)";

pub const CREATE_MEMORIES_ACTIVATION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memories_activation ON memories(activation DESC)";

pub const CREATE_MEMORIES_PATTERN_TYPE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memories_pattern_type ON memories(pattern_type)";

pub const CREATE_MEMORIES_DOMAIN_ACTIVATION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memories_domain_activation ON memories(domain, activation DESC)";

pub const CREATE_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS memory_tags (
    memory_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    tag TEXT NOT NULL,
    PRIMARY KEY (memory_id, tag)
)
"#;

pub const CREATE_TAGS_TAG_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_memory_tags_tag ON memory_tags(tag)";

pub const CREATE_COOCCURRENCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cooccurrence (
    from_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    to_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    weight REAL NOT NULL DEFAULT 0.0,
    PRIMARY KEY (from_id, to_id)
)
"#;

pub const CREATE_COOCCURRENCE_FROM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_cooccurrence_from ON cooccurrence(from_id, weight DESC)";

pub const CREATE_COOCCURRENCE_TO_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_cooccurrence_to ON cooccurrence(to_id, weight DESC)";

pub const CREATE_META_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;
