use ams_interop_connector::config::{CliConfig, Command};
use ams_interop_connector::domain::model::{
    PartyIdInfo, QuoteInput, TransactionChannelRequest, TransactionContext,
};
use ams_interop_connector::utils::{logger, validation::Validate};
use ams_interop_connector::{
    ConnectorConfig, FineractClient, HttpWorkflowGateway, InteropConnector,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let config = match ConnectorConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    if config.json_logging() {
        logger::init_json_logger(config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let store = Arc::new(FineractClient::new(&config.ams)?);
    let workflow = Arc::new(HttpWorkflowGateway::new(&config.workflow)?);
    tracing::info!("Connected to AMS {} at {}", store.version(), config.ams.base_url);
    let connector = InteropConnector::new(store, workflow, config.registration_settings()?);

    let result = match cli.command {
        Command::LookupParty { id_type, id_value } => {
            connector
                .get_party(&cli.tenant, &PartyIdInfo::new(id_type, id_value))
                .await
        }
        Command::RegisterParty {
            id_type,
            id_value,
            account,
        } => {
            connector
                .register_party(&cli.tenant, &PartyIdInfo::new(id_type, id_value), &account)
                .await
        }
        Command::Deposit { file } => {
            let request: TransactionChannelRequest =
                serde_json::from_str(&std::fs::read_to_string(file)?)?;
            connector.deposit(&cli.tenant, request).await
        }
        Command::Quote {
            id_type,
            id_value,
            file,
        } => {
            let input: QuoteInput = serde_json::from_str(&std::fs::read_to_string(file)?)?;
            let mut ctx = TransactionContext::new(
                uuid::Uuid::new_v4().to_string(),
                cli.tenant.clone(),
                &PartyIdInfo::new(id_type, id_value),
            );
            connector.send_quote(&mut ctx, &input).await
        }
    };

    match result {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.status > 202 {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!("❌ Request failed: {} (status {})", e, e.status_code());
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
