pub mod aws;

use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_PATH: &str = "settings.json";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub credentials: aws::Credentials,
    #[serde(default)]
    pub function_name: String,
    #[serde(default)]
    pub file: PathBuf,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub endpoint_url: String,
}

impl Settings {
    /// Fields left out of the document stay empty; the remote API is the one
    /// that decides whether they are acceptable.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        // Derived impls also accept sequences, which would default every field.
        expect_object(&value, "the settings document")?;
        if let Some(creds) = value.get("credentials") {
            expect_object(creds, "credentials")?;
        }
        Settings::deserialize(value)
    }
}

fn expect_object(value: &serde_json::Value, what: &str) -> Result<(), serde_json::Error> {
    if value.is_object() {
        return Ok(());
    }
    Err(serde::de::Error::custom(format!(
        "{} must be a JSON object",
        what
    )))
}

#[test]
fn test_settings_from_slice() {
    struct Case {
        json: &'static str,
        error: bool,
        function_name: &'static str,
        file: &'static str,
        region: &'static str,
        access_key_id: &'static str,
        endpoint_url: &'static str,
    }
    let cases = [
        Case {
            json: r#"{
                "credentials": {"AccessKeyID": "AKID", "SecretAccessKey": "SECRET"},
                "functionName": "resize-images",
                "file": "build/lambda.zip",
                "region": "ap-northeast-1"
            }"#,
            error: false,
            function_name: "resize-images",
            file: "build/lambda.zip",
            region: "ap-northeast-1",
            access_key_id: "AKID",
            endpoint_url: "",
        },
        Case {
            json: r#"{"functionName": "f", "endpointUrl": "http://127.0.0.1:4566"}"#,
            error: false,
            function_name: "f",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "http://127.0.0.1:4566",
        },
        Case {
            json: r#"{"functionName": "f", "unknown": 1}"#,
            error: false,
            function_name: "f",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: "{}",
            error: false,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: r#"{"functionName": "f","#,
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: r#"{"functionName": 42}"#,
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: "[]",
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: "[{}]",
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: "null",
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: r#"{"functionName": "f", "credentials": ["AKID", "SECRET"]}"#,
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
        Case {
            json: "",
            error: true,
            function_name: "",
            file: "",
            region: "",
            access_key_id: "",
            endpoint_url: "",
        },
    ];
    for c in cases {
        match Settings::from_slice(c.json.as_bytes()) {
            Ok(settings) => {
                assert!(!c.error, "expected an error for {}", c.json);
                assert_eq!(settings.function_name, c.function_name);
                assert_eq!(settings.file, PathBuf::from(c.file));
                assert_eq!(settings.region, c.region);
                assert_eq!(settings.credentials.access_key_id, c.access_key_id);
                assert_eq!(settings.endpoint_url, c.endpoint_url);
            }
            Err(err) => assert!(c.error, "unexpected error for {}: {}", c.json, err),
        }
    }
}
