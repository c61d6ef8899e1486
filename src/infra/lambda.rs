use super::super::config;
use super::{BoxError, Connect, Deploy, UpdatedFunction};
use aws_credential_types::Credentials;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;

#[derive(Clone, Debug)]
pub struct Client {
    lambda: aws_sdk_lambda::Client,
}

impl Client {
    pub async fn new(settings: &config::Settings) -> Result<Self, BoxError> {
        let aws_cfg = Self::make_aws_config(settings).await;
        require_region(&aws_cfg)?;
        Ok(Self {
            lambda: aws_sdk_lambda::Client::new(&aws_cfg),
        })
    }

    async fn make_aws_config(cfg: &config::Settings) -> aws_config::SdkConfig {
        // Empty values fall through to the default chains, which read the
        // shared ~/.aws files and the environment.
        let mut loader = aws_config::from_env();
        if !cfg.region.is_empty() {
            loader = loader.region(aws_config::Region::new(cfg.region.clone()));
        }
        if cfg.credentials.is_configured() {
            let creds = Credentials::from_keys(
                cfg.credentials.access_key_id.as_str(),
                cfg.credentials.secret_access_key.as_str(),
                None,
            );
            loader = loader.credentials_provider(creds);
        }
        if !cfg.endpoint_url.is_empty() {
            loader = loader.endpoint_url(cfg.endpoint_url.as_str());
        }
        loader.load().await
    }
}

fn require_region(aws_cfg: &aws_config::SdkConfig) -> Result<(), BoxError> {
    match aws_cfg.region() {
        Some(_) => Ok(()),
        None => Err(Box::from(
            "no region in the settings file or the shared AWS config",
        )),
    }
}

impl Deploy for Client {
    async fn update_function_code(
        &self,
        function_name: &str,
        zip_file: Vec<u8>,
    ) -> Result<UpdatedFunction, BoxError> {
        // https://docs.rs/aws-sdk-lambda/latest/aws_sdk_lambda/client/struct.Client.html#method.update_function_code
        let output = self
            .lambda
            .update_function_code()
            .function_name(function_name)
            .zip_file(Blob::new(zip_file))
            .send()
            .await
            .map_err(|err| BoxError::from(DisplayErrorContext(&err).to_string()))?;
        Ok(UpdatedFunction {
            function_name: output
                .function_name()
                .unwrap_or(function_name)
                .to_string(),
            code_sha256: output.code_sha256().map(str::to_string),
            version: output.version().map(str::to_string),
            last_modified: output.last_modified().map(str::to_string),
        })
    }
}

/// Builds Lambda clients from the settings file.
#[derive(Clone, Copy, Debug, Default)]
pub struct Connector;

impl Connect for Connector {
    type Deployer = Client;

    async fn connect(&self, settings: &config::Settings) -> Result<Client, BoxError> {
        Client::new(settings).await
    }
}

#[cfg(test)]
fn settings_for_test() -> config::Settings {
    config::Settings {
        credentials: config::aws::Credentials {
            access_key_id: "AAAAAAAAAAAAAAAAAAAA".to_string(),
            secret_access_key: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
        },
        function_name: "local-test".to_string(),
        file: "lambda.zip".into(),
        region: "ap-northeast-1".to_string(),
        endpoint_url: "http://127.0.0.1:4566".to_string(),
    }
}

#[tokio::test]
async fn test_make_aws_config_from_settings() {
    use aws_credential_types::provider::ProvideCredentials;

    let settings = settings_for_test();
    let aws_cfg = Client::make_aws_config(&settings).await;

    assert_eq!(
        aws_cfg.region().map(|r| r.as_ref().to_string()),
        Some("ap-northeast-1".to_string())
    );
    assert_eq!(aws_cfg.endpoint_url(), Some("http://127.0.0.1:4566"));
    let creds = aws_cfg
        .credentials_provider()
        .expect("a credentials provider")
        .provide_credentials()
        .await
        .unwrap();
    assert_eq!(creds.access_key_id(), "AAAAAAAAAAAAAAAAAAAA");
    assert_eq!(
        creds.secret_access_key(),
        "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
    );
}

#[tokio::test]
async fn test_make_aws_config_without_endpoint() {
    let mut settings = settings_for_test();
    settings.endpoint_url = String::new();
    let aws_cfg = Client::make_aws_config(&settings).await;
    assert_eq!(aws_cfg.endpoint_url(), None);
}

#[tokio::test]
async fn test_connector_builds_client() {
    assert!(Connector.connect(&settings_for_test()).await.is_ok());
}

#[test]
fn test_require_region() {
    let without = aws_config::SdkConfig::builder().build();
    let err = require_region(&without).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no region in the settings file or the shared AWS config"
    );

    let with = aws_config::SdkConfig::builder()
        .region(aws_config::Region::new("ap-northeast-1"))
        .build();
    assert!(require_region(&with).is_ok());
}

#[tokio::test]
async fn test_update_function_code_unreachable_endpoint() {
    use aws_sdk_lambda::config::retry::RetryConfig;

    let mut settings = settings_for_test();
    settings.endpoint_url = "http://127.0.0.1:1".to_string();
    let aws_cfg = Client::make_aws_config(&settings).await;
    let lambda_cfg = aws_sdk_lambda::config::Builder::from(&aws_cfg)
        .retry_config(RetryConfig::disabled())
        .build();
    let client = Client {
        lambda: aws_sdk_lambda::Client::from_conf(lambda_cfg),
    };

    let err = client
        .update_function_code("local-test", b"PK\x03\x04".to_vec())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("dispatch failure"), "{}", message);
    assert!(!message.contains('\n'), "{}", message);
}
