//! SQL text preparation.
//!
//! Statements are sent as text. Positional `?` placeholders are rewritten
//! into the server's parameter references before sending, and a statement
//! may carry a second part after `";\n"`: a follow-up query, or a `-- `
//! comment holding a conflict directive.

/// Separator between the two parts of a compound statement.
pub const STATEMENT_SEPARATOR: &str = ";\n";

/// Directive that turns an insert into an upsert.
const ON_CONFLICT_UPDATE: &str = "ON CONFLICT UPDATE";

/// Directive that turns a failed insert into zero affected rows.
const ON_CONFLICT_DO_NOTHING: &str = "ON CONFLICT DO NOTHING";

/// SQL text with its placeholders rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    /// Text to send.
    pub sql: String,
    /// Number of placeholders rewritten, which is the parameter count of
    /// one row when a statement is executed in batches.
    pub params_per_row: usize,
}

/// Rewrite positional `?` placeholders.
///
/// Each `?` becomes ` :%qpar(N) ` with `N` counting from 1, until either
/// the placeholders or the `param_count` parameters run out.
#[must_use]
pub fn rewrite_placeholders(sql: &str, param_count: usize) -> PreparedText {
    let mut out = String::with_capacity(sql.len() + param_count * 12);
    let mut rewritten = 0;
    let mut rest = sql;

    while rewritten < param_count {
        let Some(pos) = rest.find('?') else { break };
        out.push_str(&rest[..pos]);
        rewritten += 1;
        out.push_str(&format!(" :%qpar({rewritten}) "));
        rest = &rest[pos + 1..];
    }
    out.push_str(rest);

    PreparedText {
        sql: out,
        params_per_row: rewritten,
    }
}

/// Split a compound statement into its two parts.
///
/// Returns `None` unless the text splits into exactly two parts.
#[must_use]
pub fn split_compound(sql: &str) -> Option<(&str, &str)> {
    let mut parts = sql.split(STATEMENT_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) => Some((first, second)),
        _ => None,
    }
}

/// How a failed or conflicting insert is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictAction {
    /// Errors are reported.
    #[default]
    None,
    /// The insert was rewritten into an upsert before sending.
    Update,
    /// An SQL error is reported as zero affected rows.
    DoNothing,
}

/// An update statement after directive handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateText {
    /// Text to send.
    pub sql: String,
    /// Conflict handling requested by a directive.
    pub on_conflict: ConflictAction,
}

/// Apply a trailing conflict directive to an update statement.
///
/// The directive is read from the text after `-- ` in the second part of a
/// compound statement. `ON CONFLICT UPDATE` rewrites the first
/// `INSERT INTO` to `INSERT OR UPDATE`.
#[must_use]
pub fn apply_conflict_directive(sql: &str) -> UpdateText {
    let Some((statement, trailer)) = split_compound(sql) else {
        return UpdateText {
            sql: sql.to_string(),
            on_conflict: ConflictAction::None,
        };
    };

    let directive = trailer.split("-- ").nth(1).unwrap_or_default();
    if directive.contains(ON_CONFLICT_UPDATE) {
        UpdateText {
            sql: statement.replacen("INSERT INTO", "INSERT OR UPDATE", 1),
            on_conflict: ConflictAction::Update,
        }
    } else if directive.contains(ON_CONFLICT_DO_NOTHING) {
        UpdateText {
            sql: statement.to_string(),
            on_conflict: ConflictAction::DoNothing,
        }
    } else {
        UpdateText {
            sql: statement.to_string(),
            on_conflict: ConflictAction::None,
        }
    }
}
