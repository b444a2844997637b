//! Markdown rendering of the review header and per-file content blocks.
//!
//! Every string produced here uses LF line endings only. Embedded file text
//! is normalized (CRLF and lone CR become LF) before it is measured, so the
//! logical payload size and the bytes later written to disk agree.

use crate::delta::{FileEntry, FileStatus};
use crate::BundleLimits;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Substrings that mark truncated content. Forbidden in any part unless the
/// bundle is an incomplete `truncate`-policy bundle.
pub const TRUNCATION_MARKERS: &[&str] = &["Content truncated at", "<!-- truncated -->"];

/// Zone types every primary part must contain.
pub const MANDATORY_ZONES: &[&str] = &["summary", "files_manifest"];

/// Closing marker of any zone.
pub const ZONE_END: &str = "<!-- zone:end -->";

/// Opening marker of zone `kind`.
pub fn zone_begin(kind: &str) -> String {
    format!("<!-- zone:begin type={} -->", kind)
}

/// Continuation header that opens part `number` (2..N).
///
/// It is overhead: not part of the logical payload.
pub fn continuation_header(number: usize) -> String {
    format!("# PR-Review (Part {})\n\n", number)
}

/// Rendered representation of one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// Text embedded in a fenced code block.
    Embedded { language: String, text: String },
    /// Content withheld because it is or contains a secret.
    Redacted { reason: String },
    /// Content withheld for size or other non-secret reasons.
    Omitted { reason: String },
    /// Binary content.
    Binary,
    /// The file could not be read.
    ReadError { message: String },
}

impl ContentBlock {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            ContentBlock::Embedded { .. } => "embedded",
            ContentBlock::Redacted { .. } => "redacted",
            ContentBlock::Omitted { .. } => "omitted",
            ContentBlock::Binary => "binary",
            ContentBlock::ReadError { .. } => "read_error",
        }
    }
}

/// Normalize line endings to LF.
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Whether the leading window of `data` contains a NUL byte.
pub fn looks_binary(data: &[u8], limits: &BundleLimits) -> bool {
    let window = data.len().min(limits.binary_sniff_bytes);
    data[..window].contains(&0)
}

/// Whether `text` contains any truncation marker.
pub fn contains_truncation_marker(text: &str) -> bool {
    TRUNCATION_MARKERS.iter().any(|m| text.contains(m))
}

/// Fence language for a path, from its extension or well-known file name.
pub fn infer_language(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name {
        "Dockerfile" => return "dockerfile",
        "Makefile" | "Justfile" => return "makefile",
        "Jenkinsfile" => return "groovy",
        _ => {}
    }
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "ts" => "typescript",
        "tsx" => "tsx",
        "go" => "go",
        "java" => "java",
        "kt" => "kotlin",
        "c" | "h" => "c",
        "cc" | "cpp" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "sh" | "bash" | "zsh" => "bash",
        "ps1" => "powershell",
        "sql" => "sql",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "xml" => "xml",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "md" => "markdown",
        "proto" => "protobuf",
        "graphql" | "gql" => "graphql",
        "ini" | "cfg" => "ini",
        _ => "",
    }
}

/// Backtick fence longer than any backtick run in `text` (minimum three).
fn fence_for(text: &str) -> String {
    let mut longest = 0usize;
    let mut run = 0usize;
    for c in text.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Assign unique HTML anchors to paths, in order.
pub fn assign_anchors<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut anchors = Vec::new();
    for path in paths {
        let mut slug: String = path
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '-'
                }
            })
            .collect();
        slug = slug.trim_matches('-').to_string();
        let base = format!("file-{}", slug);
        let mut anchor = base.clone();
        let mut n = 2;
        while !seen.insert(anchor.clone()) {
            anchor = format!("{}-{}", base, n);
            n += 1;
        }
        anchors.push(anchor);
    }
    anchors
}

/// Make untrusted text (paths, repo name, notes) safe for Markdown prose.
///
/// HTML metacharacters are escaped and the plain-text truncation phrase is
/// broken with a numeric space entity. The result never contains a
/// truncation marker.
pub fn neutralize(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace("Content truncated at", "Content&#32;truncated at")
}

fn escape_cell(text: &str) -> String {
    neutralize(text).replace('|', "\\|")
}

/// Inputs of the review header.
pub struct HeaderContext<'a> {
    pub repo: &'a str,
    pub generated_at: DateTime<Utc>,
    pub generator: &'a str,
    pub entries: &'a [FileEntry],
    /// Anchor per reviewable entry, `None` for removed entries.
    pub anchors: &'a [Option<String>],
}

/// Render the header: title plus the mandatory summary and files-manifest zones.
pub fn render_header(ctx: &HeaderContext<'_>) -> String {
    let count = |status: FileStatus| ctx.entries.iter().filter(|e| e.status == status).count();

    let mut out = String::new();
    out.push_str(&format!("# PR-Review: {}\n\n", neutralize(ctx.repo)));
    out.push_str(&format!(
        "Generated {} by {}\n\n",
        ctx.generated_at.format("%Y-%m-%dT%H:%M:%SZ"),
        neutralize(ctx.generator)
    ));

    out.push_str(&zone_begin("summary"));
    out.push('\n');
    out.push_str("## Summary\n\n");
    out.push_str("| Added | Changed | Removed |\n");
    out.push_str("|------:|--------:|--------:|\n");
    out.push_str(&format!(
        "| {} | {} | {} |\n",
        count(FileStatus::Added),
        count(FileStatus::Changed),
        count(FileStatus::Removed)
    ));
    out.push_str(ZONE_END);
    out.push_str("\n\n");

    out.push_str(&zone_begin("files_manifest"));
    out.push('\n');
    out.push_str("## Files\n\n");
    if ctx.entries.is_empty() {
        out.push_str("_No changes._\n");
    } else {
        out.push_str("| Status | Category | Size | Path |\n");
        out.push_str("|--------|----------|-----:|------|\n");
        for (entry, anchor) in ctx.entries.iter().zip(ctx.anchors) {
            let path = escape_cell(&entry.path);
            let link = match anchor {
                Some(a) => format!("[{}](#{})", path, a),
                None => path,
            };
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                entry.status, entry.category, entry.size, link
            ));
        }
    }
    out.push_str(ZONE_END);
    out.push_str("\n\n");
    out
}

/// Render the block for one reviewable file.
pub fn render_file_block(entry: &FileEntry, anchor: &str, content: &ContentBlock) -> String {
    let mut out = String::new();
    out.push_str(&format!("<a id=\"{}\"></a>\n", anchor));
    out.push_str(&format!("### {}\n\n", neutralize(&entry.path)));
    out.push_str(&format!(
        "_{} · {} · {} bytes_\n\n",
        entry.status, entry.category, entry.size
    ));

    match content {
        ContentBlock::Embedded { language, text } => {
            let fence = fence_for(text);
            out.push_str(&fence);
            out.push_str(language);
            out.push('\n');
            out.push_str(text);
            if !text.is_empty() && !text.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }
        ContentBlock::Redacted { reason } => {
            out.push_str(&format!("> Redacted: {}\n", neutralize(reason)));
        }
        ContentBlock::Omitted { reason } => {
            out.push_str(&format!("> Omitted: {}\n", neutralize(reason)));
        }
        ContentBlock::Binary => {
            out.push_str("> Binary file, content not shown.\n");
        }
        ContentBlock::ReadError { message } => {
            out.push_str(&format!("> Read error: {}\n", neutralize(message)));
        }
    }
    out.push('\n');
    out
}
