//! filesystem and network io
//!
//! loads the schema from a file or url, collects executable documents, and
//! writes generated artifacts and the operation-id manifest.

use crate::codegen::GeneratedOutput;
use crate::error::{Error, Result};
use crate::frontend::SourceDocument;
use crate::schema::Schema;
use reqwest::blocking::Client as BlockingClient;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

const DOCUMENT_EXTENSIONS: [&str; 2] = ["graphql", "gql"];

/// where the schema sdl comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Url { url: Url, token: Option<String> },
}

impl SchemaSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SchemaSource::File(path.into())
    }

    /// http(s) endpoint serving the schema sdl, with an optional bearer token
    pub fn url(url: &str, token: Option<String>) -> Result<Self> {
        let url = Url::parse(url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "unsupported schema url scheme: {}",
                url.scheme()
            )));
        }
        Ok(SchemaSource::Url { url, token })
    }
}

/// read and parse the schema
pub fn load_schema(source: &SchemaSource) -> Result<Schema> {
    let sdl = match source {
        SchemaSource::File(path) => {
            tracing::debug!(path = %path.display(), "reading schema");
            fs::read_to_string(path).map_err(|err| Error::io(path, err))?
        }
        SchemaSource::Url { url, token } => fetch_schema(url, token.as_deref())?,
    };
    Schema::parse(&sdl)
}

fn fetch_schema(url: &Url, token: Option<&str>) -> Result<String> {
    tracing::debug!(%url, "fetching schema");
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| Error::Config(format!("invalid token header value: {err}")))?,
        );
    }

    let response = BlockingClient::new()
        .get(url.clone())
        .headers(headers)
        .send()?;
    let status = response.status();
    let text = response.text()?;
    if !status.is_success() {
        return Err(Error::Schema(format!(
            "schema request to {url} failed with status {}",
            status.as_u16()
        )));
    }
    Ok(text)
}

/// read executable documents; directories are searched recursively for
/// `.graphql` and `.gql` files in path order
pub fn read_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_document_files(path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let text = fs::read_to_string(&file).map_err(|err| Error::io(&file, err))?;
        tracing::debug!(path = %file.display(), "read document");
        documents.push(SourceDocument::new(file, text));
    }
    if documents.is_empty() {
        return Err(Error::Document("no graphql documents found".to_string()));
    }
    Ok(documents)
}

fn collect_document_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| Error::io(dir, err))? {
        entries.push(entry.map_err(|err| Error::io(dir, err))?.path());
    }
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_document_files(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// write every artifact under `out_dir`, creating directories as needed
pub fn write_output(output: &GeneratedOutput, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|err| Error::io(out_dir, err))?;

    let mut written = Vec::with_capacity(output.files().len());
    for (relative, text) in output.files() {
        let path = out_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
        }
        fs::write(&path, text).map_err(|err| Error::io(&path, err))?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "wrote artifact");
        written.push(path);
    }
    Ok(written)
}

/// write the operation-id manifest as json
pub fn write_operation_ids(output: &GeneratedOutput, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::io(parent, err))?;
    }
    fs::write(path, output.operation_ids_json()?).map_err(|err| Error::io(path, err))?;
    tracing::debug!(
        path = %path.display(),
        operations = output.operation_ids().len(),
        "wrote operation ids"
    );
    Ok(())
}
