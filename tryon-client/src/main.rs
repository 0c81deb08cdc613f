//! CLI for the virtual try-on relay.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use shared::Category;
use tracing_subscriber::EnvFilter;
use tryon_client::{Credential, ResultView, TryOnClient, Workflow};

#[derive(Parser)]
#[command(name = "tryon")]
#[command(about = "Try on makeup, clothes and styles on your own photo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the relay
    #[arg(long, global = true, default_value = "http://localhost:5000")]
    server: String,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a photo and a prompt
    Generate(GenerateArgs),

    /// Exchange email and password for a session token
    Login(LoginArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// What to change, e.g. "red lipstick"
    prompt: String,

    /// Photo of the person
    #[arg(short, long)]
    image: PathBuf,

    #[arg(short, long, value_enum, default_value = "other")]
    category: CategoryArg,

    /// File or directory for the generated image
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Session token from `tryon login`
    #[arg(long)]
    token: Option<String>,

    /// Route of the generation endpoint on the server
    #[arg(long, default_value = tryon_client::client::DEFAULT_GENERATE_PATH)]
    path: String,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Makeup,
    Clothes,
    StyleAdvice,
    Other,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Makeup => Category::Makeup,
            CategoryArg::Clothes => Category::Clothes,
            CategoryArg::StyleAdvice => Category::StyleAdvice,
            CategoryArg::Other => Category::Other,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = TryOnClient::new(&cli.server);

    match cli.command {
        Commands::Generate(args) => generate(client, args, cli.json).await,
        Commands::Login(args) => login(client, args, cli.json).await,
    }
}

async fn generate(client: TryOnClient, args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let workflow = Workflow::new(client.with_generate_path(args.path));
    workflow.choose_file(&args.image).await?;

    let credential = args.token.map(Credential::new);
    workflow
        .apply(&args.prompt, args.category.into(), credential.as_ref())
        .await?;

    let view = workflow.view().await;
    let result = match &view {
        ResultView::Image { .. } => {
            let saved = view.download(&args.output).await?;
            serde_json::json!({ "type": "image", "output": saved.display().to_string() })
        }
        ResultView::TextOnly { message, .. } => serde_json::json!({ "type": "text", "message": message }),
        ResultView::Error { toast } => anyhow::bail!("{toast}"),
        ResultView::Empty | ResultView::Generating => anyhow::bail!("No result"),
    };
    workflow.reset().await;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(output) = result["output"].as_str() {
        println!("Saved try-on result to {output}");
    } else if let Some(message) = result["message"].as_str() {
        println!("The model answered without an image: {message}");
    }

    Ok(())
}

async fn login(client: TryOnClient, args: LoginArgs, json_output: bool) -> anyhow::Result<()> {
    let credential = client.login(&args.email, &args.password).await?;

    if json_output {
        println!("{}", serde_json::json!({ "token": credential.token() }));
    } else {
        println!("{}", credential.token());
    }

    Ok(())
}
