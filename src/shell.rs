//! Shell command execution shared by command actions, measurements and
//! the command-driven instrument.

use std::process::Stdio;

use tokio::process::Command;

/// Run `command` through `sh -c` and return its trimmed stdout.
///
/// A spawn failure or a non-zero exit status is returned as a
/// human-readable message; callers wrap it in their own error variant.
pub async fn capture(command: &str) -> std::result::Result<String, String> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| format!("'{}' could not be started: {}", command, e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut message = format!("'{}' exited with code {:?}", command, output.status.code());
        if !stderr.trim().is_empty() {
            message.push_str(&format!(": {}", stderr.trim()));
        }
        Err(message)
    }
}
