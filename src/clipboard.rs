use anyhow::{anyhow, Result};
use std::io::Write;
use std::process::{Command, Stdio};

// Candidate helpers in preference order, one per platform family.
const HELPERS: &[&[&str]] = &[
    &["pbcopy"],
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["xsel", "--clipboard", "--input"],
];

/// Write `text` to the system clipboard through the first helper that
/// accepts it. Callers fall back to printing the payload on error.
pub fn copy_text(text: &str) -> Result<()> {
    for helper in HELPERS {
        let Ok(mut child) = Command::new(helper[0])
            .args(&helper[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        if let Some(mut stdin) = child.stdin.take() {
            if stdin.write_all(text.as_bytes()).is_err() {
                let _ = child.wait();
                continue;
            }
        }

        match child.wait() {
            Ok(status) if status.success() => return Ok(()),
            _ => continue,
        }
    }
    Err(anyhow!(
        "no clipboard helper succeeded (tried pbcopy, wl-copy, xclip, xsel)"
    ))
}
