pub const SCHEMA: &str = "
-- Named key/value namespaces, each with its own monotonic sequence
CREATE TABLE IF NOT EXISTS buckets (
    name TEXT PRIMARY KEY,              -- Namespace name, e.g. 'prompts'
    sequence INTEGER NOT NULL DEFAULT 0 -- Last value handed out by next_sequence
);

-- Bucket contents; BLOB keys sort with memcmp, so big-endian keys scan in order
CREATE TABLE IF NOT EXISTS entries (
    bucket TEXT NOT NULL REFERENCES buckets(name) ON DELETE CASCADE,
    key BLOB NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (bucket, key)
) WITHOUT ROWID;
";
