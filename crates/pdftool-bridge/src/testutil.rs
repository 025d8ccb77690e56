use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `sh` script standing in for pdf_tool.
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("pdf_tool");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Script body that writes `contents` to the path following `-o`.
pub fn writes_output(contents: &str) -> String {
    format!(
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then shift; out="$1"; fi
  shift
done
printf '%s' '{}' > "$out""#,
        contents
    )
}
