//! Reading HTML inputs from disk or standard input.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::InfraError;

const STDIN_MARKER: &str = "-";

/// One HTML document to render, labelled by where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlInput {
    pub name: String,
    pub html: String,
}

/// Read every path in order. `-` reads standard input and may appear once.
pub async fn read_inputs(paths: &[PathBuf]) -> Result<Vec<HtmlInput>, InfraError> {
    let stdin_count = paths.iter().filter(|path| is_stdin(path)).count();
    if stdin_count > 1 {
        return Err(InfraError::configuration(
            "standard input (`-`) can only be read once",
        ));
    }

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let input = if is_stdin(path) {
            read_stdin().await?
        } else {
            HtmlInput {
                name: path.display().to_string(),
                html: tokio::fs::read_to_string(path).await?,
            }
        };
        debug!(input = %input.name, bytes = input.html.len(), "Read HTML input");
        inputs.push(input);
    }
    Ok(inputs)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == STDIN_MARKER
}

async fn read_stdin() -> Result<HtmlInput, InfraError> {
    let html = tokio::task::spawn_blocking(|| std::io::read_to_string(std::io::stdin()))
        .await
        .map_err(|err| InfraError::Io(std::io::Error::other(err)))??;
    Ok(HtmlInput {
        name: "<stdin>".to_string(),
        html,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn reads_files_in_order() {
        let mut first = tempfile::NamedTempFile::new().expect("temp file");
        let mut second = tempfile::NamedTempFile::new().expect("temp file");
        write!(first, "<p>one</p>").expect("write");
        write!(second, "<p>two</p>").expect("write");

        let inputs = read_inputs(&[first.path().to_path_buf(), second.path().to_path_buf()])
            .await
            .expect("inputs");
        let html: Vec<_> = inputs.iter().map(|input| input.html.as_str()).collect();
        assert_eq!(html, ["<p>one</p>", "<p>two</p>"]);
    }

    #[tokio::test]
    async fn missing_files_are_io_errors() {
        let err = read_inputs(&[PathBuf::from("/definitely/not/here.html")])
            .await
            .expect_err("missing file");
        assert!(matches!(err, InfraError::Io(_)));
    }

    #[tokio::test]
    async fn stdin_may_only_be_named_once() {
        let err = read_inputs(&[PathBuf::from("-"), PathBuf::from("-")])
            .await
            .expect_err("double stdin");
        assert!(matches!(err, InfraError::Configuration { .. }));
    }
}
