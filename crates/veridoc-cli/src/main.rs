//! Operator CLI: ticket administration, document verification, finalisation,
//! and document-request messaging against an embedded DuckDB database.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use uuid::Uuid;
use veridoc_core::{
    Customer, DocumentType, ExpectedIdentity, ExtractedRecord, RulePolicy, TicketCategory,
};
use veridoc_engine::VerificationEngine;
use veridoc_extract::{Artifact, ExtractError, FieldExtractor, OpenAiExtractor};
use veridoc_notify::{Brand, TwilioWhatsApp, WhatsAppSender};
use veridoc_store::{DocumentStore, DuckStore, TicketStore};

#[derive(Parser)]
#[command(name = "veridoc", version, about = "Document verification back office")]
struct Cli {
    /// Path to the DuckDB database file.
    #[arg(long, global = true, env = "VERIDOC_DB", default_value = "veridoc.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ExtractorOpts {
    /// OpenAI-compatible API base URL.
    #[arg(long, env = "VERIDOC_API_BASE", default_value = "https://api.openai.com")]
    api_base: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "VERIDOC_MODEL", default_value = "gpt-4o")]
    model: String,
}

#[derive(Args)]
struct PolicyOpts {
    /// Payslip recency window, in calendar months.
    #[arg(long, default_value_t = 2)]
    payslip_recency_months: u32,

    /// Minimum bank statement transaction span, in days.
    #[arg(long, default_value_t = 60)]
    bank_statement_min_span_days: i64,

    /// Passport expiry grace window, in calendar months.
    #[arg(long, default_value_t = 2)]
    passport_expiry_grace_months: u32,

    /// Driving license expiry grace window, in calendar months.
    #[arg(long, default_value_t = 2)]
    license_expiry_grace_months: u32,
}

impl From<&PolicyOpts> for RulePolicy {
    fn from(opts: &PolicyOpts) -> Self {
        Self {
            payslip_recency_months: opts.payslip_recency_months,
            bank_statement_min_span_days: opts.bank_statement_min_span_days,
            passport_expiry_grace_months: opts.passport_expiry_grace_months,
            license_expiry_grace_months: opts.license_expiry_grace_months,
            ..Self::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create the database schema.
    Init,

    /// Register a customer and print their id.
    AddCustomer {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
    },

    /// Open a verification ticket for a customer.
    CreateTicket {
        /// Customer id the ticket belongs to.
        #[arg(long)]
        user_id: Uuid,
        /// Ticket category: Income, KYC, or "KYC and Income".
        #[arg(long)]
        category: TicketCategory,
    },

    /// Verify one uploaded document against a ticket.
    Verify {
        ticket_id: String,
        /// Declared document type, e.g. "Passport" or "Bank Statement".
        document_type: DocumentType,
        file: PathBuf,
        #[command(flatten)]
        extractor: ExtractorOpts,
        #[command(flatten)]
        policy: PolicyOpts,
    },

    /// Mark all documents submitted; resolve the ticket if everything verified.
    Finalize { ticket_id: String },

    /// List the documents recorded for a ticket.
    Documents { ticket_id: String },

    /// Build (and optionally send) the document upload request message.
    RequestDocuments {
        ticket_id: String,
        #[arg(long, default_value = "OakBrook Finance")]
        brand: String,
        #[arg(long, env = "VERIDOC_PORTAL_BASE", default_value = "https://obfdocvalidator.example.com")]
        portal_base: String,
        /// Send via WhatsApp to this number instead of printing only.
        #[arg(long)]
        whatsapp_to: Option<String>,
        #[arg(long, env = "TWILIO_ACCOUNT_SID")]
        twilio_sid: Option<String>,
        #[arg(long, env = "TWILIO_AUTH_TOKEN", hide_env_values = true)]
        twilio_token: Option<String>,
        #[arg(long, env = "TWILIO_WHATSAPP_FROM")]
        twilio_from: Option<String>,
    },
}

/// Extractor for flows that never extract (finalisation, listings).
struct NoExtraction;

#[async_trait]
impl FieldExtractor for NoExtraction {
    async fn extract(
        &self,
        _document_type: DocumentType,
        _artifact: Artifact,
    ) -> Result<ExtractedRecord, ExtractError> {
        Err(ExtractError::Io(std::io::Error::other(
            "no extraction backend configured",
        )))
    }
}

fn open_store(db: &PathBuf) -> anyhow::Result<Arc<DuckStore>> {
    let store = DuckStore::open_persistent(db)
        .with_context(|| format!("open database {}", db.display()))?;
    store.init_schema()?;
    Ok(Arc::new(store))
}

fn parse_ticket_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw.trim()).context("ticket id is not a valid UUID")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let store = open_store(&cli.db)?;

    match cli.command {
        Command::Init => {
            println!("schema ready at {}", cli.db.display());
        }

        Command::AddCustomer {
            first_name,
            last_name,
            email,
            phone,
        } => {
            let customer = Customer {
                id: Uuid::new_v4(),
                first_name,
                last_name,
                email,
                phone,
            };
            store.create_customer(&customer)?;
            info!(customer_id = %customer.id, "customer registered");
            println!("{}", customer.id);
        }

        Command::CreateTicket { user_id, category } => {
            let customer = store
                .get_customer(user_id)?
                .context("no customer with that id")?;
            let ticket = store.create_ticket(customer.id, category)?;
            info!(ticket_id = %ticket.id, %category, "ticket opened");
            println!("{}", ticket.id);
        }

        Command::Verify {
            ticket_id,
            document_type,
            file,
            extractor,
            policy,
        } => {
            let id = parse_ticket_id(&ticket_id)?;
            let ticket = store.get_ticket(id)?.context("unknown ticket")?;
            let customer = store
                .get_customer(ticket.user_id)?
                .context("ticket has no owning customer")?;
            let identity = ExpectedIdentity::from(&customer);

            let engine = VerificationEngine::new(
                store.clone(),
                store.clone(),
                Arc::new(OpenAiExtractor::new(
                    extractor.api_base,
                    extractor.api_key,
                    extractor.model,
                )),
                RulePolicy::from(&policy),
            );
            let verdict = engine
                .process_upload(&ticket_id, document_type, &file, &identity)
                .await?;
            info!(%ticket_id, %document_type, %verdict, "document verified");
            println!("{verdict}");
        }

        Command::Finalize { ticket_id } => {
            parse_ticket_id(&ticket_id)?;
            let engine = VerificationEngine::new(
                store.clone(),
                store.clone(),
                Arc::new(NoExtraction),
                RulePolicy::default(),
            );
            let status = engine.finalize_ticket(&ticket_id).await?;
            info!(%ticket_id, %status, "ticket finalised");
            println!("{status}");
        }

        Command::Documents { ticket_id } => {
            let id = parse_ticket_id(&ticket_id)?;
            for doc in store.list_documents(id)? {
                println!(
                    "{}\t{}\t{}\t{}",
                    doc.id, doc.document_type, doc.verdict, doc.storage_link
                );
            }
        }

        Command::RequestDocuments {
            ticket_id,
            brand,
            portal_base,
            whatsapp_to,
            twilio_sid,
            twilio_token,
            twilio_from,
        } => {
            let id = parse_ticket_id(&ticket_id)?;
            let ticket = store.get_ticket(id)?.context("unknown ticket")?;
            let customer = store
                .get_customer(ticket.user_id)?
                .context("ticket has no owning customer")?;

            let brand = Brand::new(brand, portal_base);
            let subject = veridoc_notify::upload_request_subject(&brand);
            let body = veridoc_notify::upload_request_body(&brand, &customer, &ticket);

            if let Some(to) = whatsapp_to {
                let sender = TwilioWhatsApp::new(
                    twilio_sid.context("--twilio-sid required to send")?,
                    twilio_token.context("--twilio-token required to send")?,
                    twilio_from.context("--twilio-from required to send")?,
                );
                let sid = sender.send_whatsapp(&to, &body).await?;
                println!("sent: {sid}");
            } else {
                println!("{subject}\n\n{body}");
            }
        }
    }

    Ok(())
}
