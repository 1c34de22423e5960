use anyhow::{bail, Result};
use clap::Parser;
use common::data::CandidateFile;
use reqwest::Client;
use std::path::PathBuf;
use vidsend_client::{
    api::ApiConfig,
    session::{SessionState, UploadSession},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Video file to upload
    pub file: PathBuf,

    /// Override the API base URL
    #[arg(short, long)]
    pub base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ApiConfig::resolve(args.base_url.as_deref())?;

    let metadata = tokio::fs::metadata(&args.file).await?;
    if !metadata.is_file() {
        bail!("not a file: {}", args.file.display());
    }
    let candidate = CandidateFile::new(args.file.clone(), metadata.len());

    let client = Client::builder()
        .user_agent(concat!("vidsend/", env!("CARGO_PKG_VERSION")))
        .cookie_store(true)
        .build()?;

    let upload_url = config.upload_url();
    let mut session = UploadSession::new(upload_url.clone()).on_success(|file| {
        eprintln!("Upload successful: {} ({} bytes)", file.name, file.size);
    });

    session.select(candidate);
    if let SessionState::Error(message) = session.state() {
        bail!("{message}");
    }

    eprintln!("Uploading {} to {upload_url}...", args.file.display());
    match session.submit(&client).await {
        SessionState::Closed => Ok(()),
        SessionState::Error(message) => bail!("{message}"),
        state => bail!("upload ended in an unexpected state: {state:?}"),
    }
}
