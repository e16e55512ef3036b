//! Heuristic pattern tables used by signal derivation.
//!
//! Every pattern here is a deliberately approximate signal, not ground
//! truth. They are kept as explicit ordered tables so false-positive risk
//! stays reviewable in one place instead of scattered conditionals.

use std::sync::LazyLock;

use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern table regex must compile")
}

/// URL or host-ish token. False positives: dotted identifiers such as
/// `schema.table.column` inside literals also match.
pub static RE_HARDCODED_HOST: LazyLock<Regex> = LazyLock::new(|| {
    re(r#"(https?://[^\s"']+)|(\b[A-Za-z0-9\-_]+\.[A-Za-z0-9\-_]+\.[A-Za-z]{2,}\b)"#)
});

/// Incremental-refresh range parameter names.
pub static RE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bRangeStart\b|\bRangeEnd\b"));

/// Quoted step references, used as a step-bloat proxy. Overcounts when a
/// step is referenced more than once.
pub static RE_STEP: LazyLock<Regex> = LazyLock::new(|| re(r#"#"\s*[^"]+\s*""#));

/// Early-filter hint: a row filter call or a WHERE-like token.
pub static RE_FILTER: LazyLock<Regex> =
    LazyLock::new(|| re(r"(?i)\bTable\.SelectRows\b|\bWHERE\b"));

/// Heavy transformation calls that matter for folding and refresh cost.
pub static RE_HEAVY: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\bTable\.(Group|Join|NestedJoin|ExpandTableColumn|TransformColumns|AddColumn|Sort)\b")
});

/// Calls known to prevent query folding. Presence is a risk indicator
/// only; a breaker late in a chain may be harmless.
pub static FOLDING_BREAKERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (re(r"(?i)\bTable\.Buffer\b"), "Table.Buffer"),
        (re(r"(?i)\bBinary\.Decompress\b"), "Binary.Decompress"),
        (
            re(r"(?i)\bTable\.ToRecords\b|\bRecord\.ToTable\b"),
            "Record/List materialization",
        ),
        (re(r"(?i)\bOdbc\.Query\b"), "Odbc.Query"),
    ]
});

/// Source constructors called with a literal first argument. Ordered;
/// the first match wins. A literal that merely resembles a host (for
/// example a database named like a domain) still counts as a hit.
pub static SOURCE_LITERAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        re(r#"(?i)\bSql\.Database\s*\(\s*"[^"]+"\s*,\s*"[^"]+""#),
        re(r#"(?i)\bWeb\.Contents\s*\(\s*"https?://"#),
        re(r#"(?i)\bFile\.Contents\s*\(\s*"[A-Za-z]:\\"#),
        re(r#"(?i)\bOdbc\.DataSource\s*\(\s*"[^"]+""#),
        re(r#"(?i)\bDatabricks\.Catalogs\s*\(\s*"[^"]+""#),
    ]
});

/// Source constructor whose first argument is an identifier, suggesting a
/// parameterized call.
pub static RE_SOURCE_PARAM_HINT: LazyLock<Regex> = LazyLock::new(|| {
    re(r"(?i)\b(Sql\.Database|Databricks\.Catalogs|Web\.Contents|File\.Contents|Odbc\.DataSource)\s*\(\s*[A-Za-z_][A-Za-z0-9_]*")
});

/// Connector-call signatures. A snippet may match several; zero matches
/// records the item as `Unknown`.
pub static SOURCE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (re(r"(?i)\bSql\.Database\b"), "SQL Server"),
        (re(r"(?i)\bDatabricks\.Catalogs\b"), "Databricks"),
        (re(r"(?i)\bPowerBI\.Dataflows\b"), "Power BI Dataflows"),
        (re(r"(?i)\bWeb\.Contents\b"), "Web/API"),
        (re(r"(?i)\bFile\.Contents\b"), "File"),
        (re(r"(?i)\bOdbc\.(DataSource|Query)\b"), "ODBC"),
        (re(r"(?i)\bOleDb\.DataSource\b"), "OLE DB"),
        (re(r"(?i)\bSnowflake\.Databases\b"), "Snowflake"),
        (re(r"(?i)\bGoogleBigQuery\.Database\b"), "BigQuery"),
        (re(r"(?i)\bSapHana\.Database\b"), "SAP HANA"),
    ]
});
