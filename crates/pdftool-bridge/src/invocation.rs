//! Invocation builder
//!
//! Turns an operation and staged inputs into the exact argv for the tool:
//!
//! ```text
//! <tool_path> -f <operation> -i <input>... -o <storage_dir>/<op>_result_<unix>.<ext>
//! ```
//!
//! The arguments are kept as a list and handed to the OS unmodified, so no
//! shell ever parses them and file names cannot inject commands.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::BridgeConfig;
use crate::operation::Operation;
use crate::stage::StagedFile;

/// Fully resolved command for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub operation: Operation,
    pub inputs: Vec<PathBuf>,
    pub output_path: PathBuf,
}

impl Invocation {
    /// Build the invocation stamped with the current time.
    pub fn build(config: &BridgeConfig, operation: Operation, inputs: &[StagedFile]) -> Self {
        Self::build_at(config, operation, inputs, Utc::now().timestamp())
    }

    /// Build the invocation for an explicit unix timestamp.
    pub fn build_at(
        config: &BridgeConfig,
        operation: Operation,
        inputs: &[StagedFile],
        timestamp: i64,
    ) -> Self {
        let output_path = config
            .storage_dir
            .join(output_file_name(&operation, timestamp));

        Self {
            program: config.tool_path.clone(),
            operation,
            inputs: inputs.iter().map(|f| f.path.clone()).collect(),
            output_path,
        }
    }

    /// Arguments in the order the tool's parser expects them
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.inputs.len() + 5);
        args.push(OsString::from("-f"));
        args.push(OsString::from(self.operation.as_str()));
        args.push(OsString::from("-i"));
        args.extend(self.inputs.iter().map(|p| p.as_os_str().to_owned()));
        args.push(OsString::from("-o"));
        args.push(self.output_path.as_os_str().to_owned());
        args
    }

    /// File name of the artifact, relative to the storage directory
    pub fn output_file_name(&self) -> &str {
        self.output_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in self.args() {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// `<op>_result_<timestamp>.<ext>`, e.g. `ocr_result_1700000000.txt`
pub fn output_file_name(operation: &Operation, timestamp: i64) -> String {
    format!(
        "{}_result_{}.{}",
        operation.as_str(),
        timestamp,
        operation.artifact_kind().extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn config() -> BridgeConfig {
        BridgeConfig::new("/opt/pdf/pdf_tool", "/srv/uploads").unwrap()
    }

    fn staged(name: &str) -> StagedFile {
        StagedFile {
            original_name: name.to_string(),
            stored_name: format!("0123abcd_{}", name),
            path: PathBuf::from(format!("/srv/uploads/0123abcd_{}", name)),
        }
    }

    #[test]
    fn ocr_writes_text_artifact() {
        let inv = Invocation::build_at(&config(), Operation::Ocr, &[staged("scan.pdf")], 1_700_000_000);
        assert_eq!(inv.output_file_name(), "ocr_result_1700000000.txt");
        assert_eq!(
            inv.output_path(),
            Path::new("/srv/uploads/ocr_result_1700000000.txt")
        );
    }

    #[test]
    fn other_operations_write_pdf() {
        let inputs = [staged("a.pdf")];
        let blend = Invocation::build_at(&config(), Operation::Blend, &inputs, 42);
        let convert = Invocation::build_at(&config(), Operation::Convert, &inputs, 42);
        let other = Invocation::build_at(&config(), Operation::Other("rotate".into()), &inputs, 42);

        assert_eq!(blend.output_file_name(), "blend_result_42.pdf");
        assert_eq!(convert.output_file_name(), "convert_result_42.pdf");
        assert_eq!(other.output_file_name(), "rotate_result_42.pdf");
    }

    #[test]
    fn program_comes_from_config() {
        let inv = Invocation::build(&config(), Operation::Blend, &[staged("a.pdf")]);
        assert_eq!(inv.program, PathBuf::from("/opt/pdf/pdf_tool"));
    }

    #[test]
    fn args_follow_tool_convention() {
        let inv = Invocation::build_at(
            &config(),
            Operation::Blend,
            &[staged("one.pdf"), staged("two.pdf")],
            7,
        );

        let args: Vec<String> = inv
            .args()
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        assert_eq!(
            args,
            vec![
                "-f",
                "blend",
                "-i",
                "/srv/uploads/0123abcd_one.pdf",
                "/srv/uploads/0123abcd_two.pdf",
                "-o",
                "/srv/uploads/blend_result_7.pdf",
            ]
        );
    }

    #[test]
    fn metacharacter_file_name_is_one_argument() {
        let evil = "a\";rm -rf .;\".pdf";
        let inv = Invocation::build_at(&config(), Operation::Ocr, &[staged(evil)], 1);
        let args = inv.args();

        assert_eq!(args.len(), 6);
        assert_eq!(
            args[3],
            OsString::from(format!("/srv/uploads/0123abcd_{}", evil))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Property: every input maps to exactly one argument, whatever it contains
        #[test]
        fn inputs_are_atomic(names in proptest::collection::vec(r#"[a-zA-Z0-9 ;"'$&|<>()*?`._-]{1,24}"#, 1..6)) {
            let inputs: Vec<StagedFile> = names.iter().map(|n| staged(n)).collect();
            let inv = Invocation::build_at(&config(), Operation::Blend, &inputs, 99);
            let args = inv.args();

            prop_assert_eq!(args.len(), inputs.len() + 5);
            for (i, file) in inputs.iter().enumerate() {
                prop_assert_eq!(&args[3 + i], file.path.as_os_str());
            }
            prop_assert_eq!(&args[args.len() - 1], inv.output_path.as_os_str());
        }
    }
}
