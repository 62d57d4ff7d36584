use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use yop_client::client::DEFAULT_FILE_FIELD;
use yop_client::config::load_config;
use yop_client::observability::logging::init_logging;
use yop_client::{FilePart, YopClient, YopRequest, YopResponse};

#[derive(Parser)]
#[command(name = "yop-cli")]
#[command(about = "Signed calls against the YOP open platform", long_about = None)]
struct Cli {
    /// Client configuration file
    #[arg(short, long, default_value = "yop.toml")]
    config: PathBuf,

    /// Overrides the configured log level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Signed GET
    Get {
        api_uri: String,
        /// Query parameter, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Signed POST, form encoded or with a JSON body
    Post {
        api_uri: String,
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Raw JSON payload
        #[arg(long)]
        json: Option<String>,
    },
    /// Upload a local file
    Upload {
        api_uri: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_FILE_FIELD)]
        field: String,
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Stream a remote resource into an upload
    UploadUrl {
        api_uri: String,
        #[arg(long)]
        source: String,
        /// File name sent to the platform; derived from the source when omitted
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = DEFAULT_FILE_FIELD)]
        field: String,
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn with_params(mut request: YopRequest, params: Vec<(String, String)>) -> YopRequest {
    for (key, value) in params {
        request.add_param(key, value);
    }
    request
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    init_logging(&config.observability)?;

    let client = YopClient::from_config(&config)?;

    let response = match cli.command {
        Commands::Get { api_uri, params } => {
            client
                .request(with_params(YopRequest::get(api_uri), params))
                .await?
        }
        Commands::Post {
            api_uri,
            params,
            json,
        } => {
            let mut request = with_params(YopRequest::post(api_uri), params);
            if let Some(json) = json {
                request = request.content(json);
            }
            client.request(request).await?
        }
        Commands::Upload {
            api_uri,
            file,
            field,
            params,
        } => {
            let request = with_params(YopRequest::post(api_uri), params)
                .file(field, FilePart::from_path(file));
            client.request(request).await?
        }
        Commands::UploadUrl {
            api_uri,
            source,
            name,
            field,
            params,
        } => {
            let request = with_params(YopRequest::post(api_uri), params);
            client
                .upload_from_url(request, &field, name.as_deref(), &source)
                .await?
        }
    };

    print_response(&response)?;
    Ok(())
}

fn print_response(response: &YopResponse) -> Result<(), Box<dyn std::error::Error>> {
    println!("Status: {}", response.status);
    if let Some(request_id) = &response.metadata.yop_request_id {
        println!("Request-Id: {}", request_id);
    }
    match &response.result {
        Some(result) => println!("{}", serde_json::to_string_pretty(result)?),
        None => match serde_json::from_slice::<Value>(&response.content) {
            Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
            Err(_) => println!("<{} bytes>", response.content.len()),
        },
    }
    Ok(())
}
