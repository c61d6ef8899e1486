pub mod file;
pub mod lambda;

use super::config;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What the remote API reports back after swapping the function code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatedFunction {
    pub function_name: String,
    pub code_sha256: Option<String>,
    pub version: Option<String>,
    pub last_modified: Option<String>,
}

/// Replaces the deployed code of a function with the given package.
pub trait Deploy {
    async fn update_function_code(
        &self,
        function_name: &str,
        zip_file: Vec<u8>,
    ) -> Result<UpdatedFunction, BoxError>;
}

/// Builds an authenticated [`Deploy`] client from the settings.
pub trait Connect {
    type Deployer: Deploy;

    async fn connect(&self, settings: &config::Settings) -> Result<Self::Deployer, BoxError>;
}

#[derive(Clone, Debug)]
pub struct Client<C> {
    pub connector: C,
    pub file: file::Client,
}

impl Client<lambda::Connector> {
    pub fn new() -> Self {
        Self::with_connector(lambda::Connector)
    }
}

impl<C: Connect> Client<C> {
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            file: file::Client::new(),
        }
    }
}
