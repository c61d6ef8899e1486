use super::config::{self, Settings};
use super::infra::{self, Connect, Deploy, UpdatedFunction};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Every variant ends the run; nothing is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ERROR Opening {}: {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("ERROR Parsing {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("ERROR Opening Zip File {}: {source}", .path.display())]
    ArtifactRead { path: PathBuf, source: io::Error },

    #[error("ERROR CREATING AWS SESSION: {0}")]
    Setup(infra::BoxError),

    #[error("ERROR UPDATING LAMBDA FUNCTION: {0}")]
    Update(infra::BoxError),
}

#[derive(Clone, Debug)]
pub struct Updated {
    pub function_name: String,
    pub remote: UpdatedFunction,
}

impl fmt::Display for Updated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lambda Function {} Has Been Successfully Updated!",
            self.function_name
        )
    }
}

pub struct Updater<C> {
    client: infra::Client<C>,
}

impl<C: Connect> Updater<C> {
    pub fn new(client: infra::Client<C>) -> Self {
        Self { client }
    }

    /// Loads the settings and the package, then swaps the function code once.
    pub async fn run<P: AsRef<Path>>(&self, conf: P) -> Result<Updated, Error> {
        let settings = self.load_settings(conf.as_ref()).await?;
        let zip_file = self.load_artifact(&settings).await?;
        let deployer = self
            .client
            .connector
            .connect(&settings)
            .await
            .map_err(Error::Setup)?;
        tracing::info!(
            function = settings.function_name,
            region = settings.region,
            "client ready"
        );
        let remote = deployer
            .update_function_code(&settings.function_name, zip_file)
            .await
            .map_err(Error::Update)?;
        tracing::info!(
            function = remote.function_name,
            code_sha256 = remote.code_sha256,
            version = remote.version,
            last_modified = remote.last_modified,
            "function code updated"
        );
        Ok(Updated {
            function_name: settings.function_name,
            remote,
        })
    }

    async fn load_settings(&self, path: &Path) -> Result<Settings, Error> {
        let bytes = self
            .client
            .file
            .read(path)
            .await
            .map_err(|source| Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        let settings =
            config::Settings::from_slice(&bytes).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    async fn load_artifact(&self, settings: &Settings) -> Result<Vec<u8>, Error> {
        let zip_file = self
            .client
            .file
            .read(&settings.file)
            .await
            .map_err(|source| Error::ArtifactRead {
                path: settings.file.clone(),
                source,
            })?;
        tracing::info!(
            path = %settings.file.display(),
            bytes = zip_file.len(),
            "read package"
        );
        Ok(zip_file)
    }
}

/// Writes the single status line for a finished run.
pub fn report<W: io::Write>(out: &mut W, outcome: &Result<Updated, Error>) -> io::Result<()> {
    match outcome {
        Ok(updated) => writeln!(out, "{}", updated),
        Err(err) => writeln!(out, "{}", err),
    }
}

#[cfg(test)]
use std::{cell::RefCell, rc::Rc};

#[cfg(test)]
#[derive(Default)]
struct Recorder {
    connects: RefCell<usize>,
    calls: RefCell<Vec<(String, Vec<u8>)>>,
    connect_error: Option<&'static str>,
    update_error: Option<&'static str>,
}

#[cfg(test)]
impl Connect for Rc<Recorder> {
    type Deployer = Rc<Recorder>;

    async fn connect(&self, _settings: &Settings) -> Result<Self::Deployer, infra::BoxError> {
        *self.connects.borrow_mut() += 1;
        match self.connect_error {
            Some(msg) => Err(Box::from(msg)),
            None => Ok(Rc::clone(self)),
        }
    }
}

#[cfg(test)]
impl Deploy for Rc<Recorder> {
    async fn update_function_code(
        &self,
        function_name: &str,
        zip_file: Vec<u8>,
    ) -> Result<UpdatedFunction, infra::BoxError> {
        self.calls
            .borrow_mut()
            .push((function_name.to_string(), zip_file));
        match self.update_error {
            Some(msg) => Err(Box::from(msg)),
            None => Ok(UpdatedFunction {
                function_name: function_name.to_string(),
                code_sha256: Some("c2hhMjU2".to_string()),
                version: Some("$LATEST".to_string()),
                last_modified: None,
            }),
        }
    }
}

#[cfg(test)]
struct Fixture {
    dir: tempfile::TempDir,
    conf: PathBuf,
    package: Vec<u8>,
}

#[cfg(test)]
impl Fixture {
    /// Writes a settings file pointing at a package in the same directory.
    fn new(write_package: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("lambda.zip");
        let package: Vec<u8> = b"PK\x03\x04\x00\xff\r\n\x00"
            .iter()
            .copied()
            .chain((0..=255u8).rev())
            .collect();
        if write_package {
            std::fs::write(&zip_path, &package).unwrap();
        }
        let settings = serde_json::json!({
            "credentials": {"AccessKeyID": "AKID", "SecretAccessKey": "SECRET"},
            "functionName": "resize-images",
            "file": zip_path.to_str().unwrap(),
            "region": "ap-northeast-1",
        });
        let conf = dir.path().join(config::DEFAULT_PATH);
        std::fs::write(&conf, settings.to_string()).unwrap();
        Self { dir, conf, package }
    }

    async fn run(&self, recorder: &Rc<Recorder>) -> (Result<Updated, Error>, String) {
        let updater = Updater::new(infra::Client::with_connector(Rc::clone(recorder)));
        let outcome = updater.run(&self.conf).await;
        let mut out = Vec::new();
        report(&mut out, &outcome).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }
}

#[tokio::test]
async fn test_run_updates_function_once() {
    let fixture = Fixture::new(true);
    let recorder = Rc::new(Recorder::default());
    let (outcome, out) = fixture.run(&recorder).await;

    let updated = outcome.unwrap();
    assert_eq!(updated.function_name, "resize-images");
    assert_eq!(updated.remote.version.as_deref(), Some("$LATEST"));
    assert_eq!(*recorder.connects.borrow(), 1);
    let calls = recorder.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "resize-images");
    assert_eq!(calls[0].1, fixture.package);
    assert_eq!(
        out,
        "Lambda Function resize-images Has Been Successfully Updated!\n"
    );
}

#[tokio::test]
async fn test_run_without_settings_file() {
    let fixture = Fixture::new(true);
    std::fs::remove_file(&fixture.conf).unwrap();
    let recorder = Rc::new(Recorder::default());
    let (outcome, out) = fixture.run(&recorder).await;

    assert!(matches!(outcome, Err(Error::ConfigRead { .. })));
    assert_eq!(*recorder.connects.borrow(), 0);
    assert!(recorder.calls.borrow().is_empty());
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with(&format!("ERROR Opening {}: ", fixture.conf.display())));
}

#[tokio::test]
async fn test_run_without_package() {
    let fixture = Fixture::new(false);
    let recorder = Rc::new(Recorder::default());
    let (outcome, out) = fixture.run(&recorder).await;

    assert!(matches!(outcome, Err(Error::ArtifactRead { .. })));
    assert_eq!(*recorder.connects.borrow(), 0);
    assert!(recorder.calls.borrow().is_empty());
    assert_eq!(out.lines().count(), 1);
    let zip_path = fixture.dir.path().join("lambda.zip");
    assert!(out.starts_with(&format!("ERROR Opening Zip File {}: ", zip_path.display())));
}

#[tokio::test]
async fn test_run_with_malformed_settings() {
    let fixture = Fixture::new(true);
    std::fs::write(&fixture.conf, r#"{"functionName": "resize-images","#).unwrap();
    let recorder = Rc::new(Recorder::default());
    let (outcome, out) = fixture.run(&recorder).await;

    assert!(matches!(outcome, Err(Error::ConfigParse { .. })));
    assert_eq!(*recorder.connects.borrow(), 0);
    assert!(recorder.calls.borrow().is_empty());
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("ERROR Parsing "));
}

#[tokio::test]
async fn test_run_with_settings_array() {
    let fixture = Fixture::new(true);
    std::fs::write(&fixture.conf, "[]").unwrap();
    let recorder = Rc::new(Recorder::default());
    let (outcome, out) = fixture.run(&recorder).await;

    assert!(matches!(outcome, Err(Error::ConfigParse { .. })));
    assert_eq!(*recorder.connects.borrow(), 0);
    assert!(recorder.calls.borrow().is_empty());
    assert_eq!(
        out,
        format!(
            "ERROR Parsing {}: the settings document must be a JSON object\n",
            fixture.conf.display()
        )
    );
}

#[tokio::test]
async fn test_run_when_client_setup_fails() {
    let fixture = Fixture::new(true);
    let recorder = Rc::new(Recorder {
        connect_error: Some("no region in the settings file or the shared AWS config"),
        ..Default::default()
    });
    let (outcome, out) = fixture.run(&recorder).await;

    assert!(matches!(outcome, Err(Error::Setup(_))));
    assert_eq!(*recorder.connects.borrow(), 1);
    assert!(recorder.calls.borrow().is_empty());
    assert_eq!(
        out,
        "ERROR CREATING AWS SESSION: no region in the settings file or the shared AWS config\n"
    );
}

#[tokio::test]
async fn test_run_when_update_fails() {
    let fixture = Fixture::new(true);
    let recorder = Rc::new(Recorder {
        update_error: Some("ResourceNotFoundException: Function not found"),
        ..Default::default()
    });
    let (outcome, out) = fixture.run(&recorder).await;

    assert!(matches!(outcome, Err(Error::Update(_))));
    assert_eq!(recorder.calls.borrow().len(), 1);
    assert_eq!(
        out,
        "ERROR UPDATING LAMBDA FUNCTION: ResourceNotFoundException: Function not found\n"
    );
}
