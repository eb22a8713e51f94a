//! Pipeline driver
//!
//! Ties the stages together (classify, parse, rewrite, inline, print)
//! and then hands the generated file to the external Go toolchain. The
//! toolchain binaries are named after the architecture (`6g`/`6l` for
//! amd64, `8g`/`8l` for 386, `5g`/`5l` for arm), selected via `GOARCH`.
//!
//! For an input `prog.go` the driver produces `prog-compiled.go`, the
//! object file `prog-compiled.<digit>`, and links the executable `prog`.

use crate::span::line_col;
use crate::{classify, inline, parser, printer, rewrite};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// What to do with one input file.
#[derive(Debug, Clone)]
pub struct Options {
    pub input: PathBuf,
    /// Stop after writing the translated source
    pub just_translate: bool,
    /// Functions to inline, in order
    pub inline: Vec<String>,
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}:{col}: {message}")]
    Parse {
        path: PathBuf,
        line: u32,
        col: u32,
        message: String,
    },

    #[error(transparent)]
    Inline(#[from] inline::InlineError),

    #[error("toolchain binary {tool} not found (is GOARCH set correctly?)")]
    ToolNotFound { tool: String },

    #[error("{tool} exited with status {code:?}")]
    ToolFailed { tool: String, code: Option<i32> },
}

/// A finished translation.
#[derive(Debug)]
pub struct Translation {
    /// The generated standard Go source
    pub output: String,
    /// Human-readable notes, e.g. inline targets that did not exist
    pub warnings: Vec<String>,
}

/// The architecture digit Go's original toolchain keys its binaries on.
/// Unrecognized architectures get `9`, producing a clean "not found"
/// failure downstream rather than a guess.
pub fn arch_digit_for(goarch: Option<&str>) -> char {
    match goarch {
        Some("386") => '8',
        Some("amd64") => '6',
        Some("arm") => '5',
        _ => '9',
    }
}

fn arch_digit() -> char {
    let goarch = std::env::var("GOARCH").ok();
    arch_digit_for(goarch.as_deref())
}

/// Run the source-to-source pipeline on `source`. `path` is used only in
/// error messages.
pub fn translate(
    path: &Path,
    source: &str,
    inline_targets: &[String],
) -> Result<Translation, DriverError> {
    let buf = classify::classify(source);
    // The classifier only ever overwrites ASCII with ASCII.
    let classified = String::from_utf8(buf).map_err(|_| DriverError::Parse {
        path: path.to_path_buf(),
        line: 0,
        col: 0,
        message: "source is not valid UTF-8".to_string(),
    })?;

    let (file, errors) = parser::parse_file(&classified, true);
    if let Some(first) = errors.first() {
        let (line, col) = line_col(source, first.span().start);
        return Err(DriverError::Parse {
            path: path.to_path_buf(),
            line,
            col,
            message: first.to_string(),
        });
    }

    let mut file = rewrite::rewrite(file, source, &classified);

    let mut warnings = Vec::new();
    for name in inline_targets {
        let outcome = inline::inline_function(file, name)?;
        if !outcome.found {
            warnings.push(format!("no function named {} to inline", name));
        }
        file = outcome.file;
    }

    Ok(Translation {
        output: printer::print(&file),
        warnings,
    })
}

/// Translate `opts.input` and, unless `just_translate` is set, compile and
/// link the result. Returns the warnings gathered along the way.
pub fn run(opts: &Options) -> Result<Vec<String>, DriverError> {
    let source =
        std::fs::read_to_string(&opts.input).map_err(|source| DriverError::ReadFailed {
            path: opts.input.clone(),
            source,
        })?;

    let translation = translate(&opts.input, &source, &opts.inline)?;

    let base = opts.input.with_extension("");
    let translated = artifact(&base, &format!("-compiled.{}", crate::FILE_EXTENSION));
    std::fs::write(&translated, &translation.output).map_err(|source| {
        DriverError::WriteFailed {
            path: translated.clone(),
            source,
        }
    })?;

    if opts.just_translate {
        return Ok(translation.warnings);
    }

    let digit = arch_digit();
    let object = artifact(&base, &format!("-compiled.{}", digit));

    let compiler = format!("{}g", digit);
    run_tool(&compiler, &object, &translated)?;

    let linker = format!("{}l", digit);
    run_tool(&linker, &base, &object)?;

    Ok(translation.warnings)
}

fn artifact(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn run_tool(tool: &str, out: &Path, input: &Path) -> Result<(), DriverError> {
    let status = Command::new(tool)
        .arg("-o")
        .arg(out)
        .arg(input)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DriverError::ToolNotFound {
                    tool: tool.to_string(),
                }
            } else {
                DriverError::ToolFailed {
                    tool: tool.to_string(),
                    code: None,
                }
            }
        })?;

    if !status.success() {
        return Err(DriverError::ToolFailed {
            tool: tool.to_string(),
            code: status.code(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated(source: &str) -> String {
        translate(Path::new("test.go"), source, &[])
            .unwrap()
            .output
    }

    #[test]
    fn test_arch_digits() {
        assert_eq!(arch_digit_for(Some("386")), '8');
        assert_eq!(arch_digit_for(Some("amd64")), '6');
        assert_eq!(arch_digit_for(Some("arm")), '5');
        assert_eq!(arch_digit_for(Some("mips")), '9');
        assert_eq!(arch_digit_for(None), '9');
    }

    #[test]
    fn test_translate_vector_dialect() {
        let source = include_str!("../testdata/vec.go");
        let out = translated(source);
        assert!(out.contains("func (a Vec) P_(b Vec) Vec"), "{}", out);
        assert!(out.contains("func (a Vec) M_(b Vec) Vec"), "{}", out);
        assert!(out.contains("func (a Vec) PE_(b Vec)"), "{}", out);
        assert!(out.contains("func (v Vec) _mul_dot(f float64) Vec"), "{}", out);
        assert!(out.contains("x.M_(y)"), "{}", out);
        assert!(out.contains("x._mul_dot(2)"), "{}", out);
        assert!(!out.contains(".+"), "{}", out);
        assert!(!out.contains("*."), "{}", out);
    }

    #[test]
    fn test_translate_is_deterministic() {
        let source = include_str!("../testdata/vec.go");
        assert_eq!(translated(source), translated(source));
    }

    #[test]
    fn test_translate_plain_go_is_semantically_unchanged() {
        let source = "package main\n\nfunc main() {\n\tx := 1 + 2\n\t_ = x\n}\n";
        assert_eq!(translated(source), source);
    }

    #[test]
    fn test_trailing_dot_float_survives_translation() {
        let source = "package main\n\nfunc f(x float64) float64 {\n\treturn 2.+x\n}\n";
        let out = translated(source);
        assert!(out.contains("return 2. + x"), "{}", out);
        assert!(!out.contains("P_"), "{}", out);
    }

    #[test]
    fn test_inline_pipeline() {
        let source = include_str!("../testdata/inline.go");
        let t = translate(
            Path::new("inline.go"),
            source,
            &["hello".to_string()],
        )
        .unwrap();
        assert!(t.warnings.is_empty());
        assert!(t.output.contains("const i_inlined_hello = 0"), "{}", t.output);
        assert!(t.output.contains("(func(i int) int {"), "{}", t.output);
        assert!(!t.output.contains("func hello"), "{}", t.output);
    }

    #[test]
    fn test_missing_inline_target_warns() {
        let source = "package main\n\nfunc main() {\n}\n";
        let t = translate(Path::new("x.go"), source, &["nothing".to_string()]).unwrap();
        assert_eq!(t.warnings.len(), 1);
        assert!(t.warnings[0].contains("nothing"));
    }

    #[test]
    fn test_parse_error_carries_location() {
        let source = "package main\n\nfunc f( {\n}\n";
        let err = translate(Path::new("bad.go"), source, &[]).unwrap_err();
        let DriverError::Parse { line, .. } = &err else {
            panic!("expected parse error, got {:?}", err);
        };
        assert_eq!(*line, 3);
    }

    #[test]
    fn test_artifact_names() {
        let base = PathBuf::from("demo");
        assert_eq!(
            artifact(&base, &format!("-compiled.{}", crate::FILE_EXTENSION)),
            PathBuf::from("demo-compiled.go")
        );
        assert_eq!(artifact(&base, "-compiled.6"), PathBuf::from("demo-compiled.6"));
    }
}
