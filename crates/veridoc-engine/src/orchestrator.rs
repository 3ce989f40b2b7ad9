//! The verification engine: one synchronous pipeline per upload.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use veridoc_core::{
    evaluate, slot_key, DocumentType, ExpectedIdentity, RulePolicy, Ticket, TicketStatus, Verdict,
};
use veridoc_extract::{extract_pdf_text, normalize_to_jpeg, Artifact, FieldExtractor};
use veridoc_store::{DocumentStore, TicketStore};

use crate::EngineError;

/// Orchestrates one upload at a time: normalise, extract, evaluate, persist.
///
/// Stores and the extractor are injected at construction so deployments and
/// tests choose their own backends. The remote extraction call is the only
/// suspension point; the engine imposes no timeout or retry of its own.
pub struct VerificationEngine {
    tickets: Arc<dyn TicketStore>,
    documents: Arc<dyn DocumentStore>,
    extractor: Arc<dyn FieldExtractor>,
    policy: RulePolicy,
}

impl VerificationEngine {
    pub fn new(
        tickets: Arc<dyn TicketStore>,
        documents: Arc<dyn DocumentStore>,
        extractor: Arc<dyn FieldExtractor>,
        policy: RulePolicy,
    ) -> Self {
        Self {
            tickets,
            documents,
            extractor,
            policy,
        }
    }

    fn load_ticket(&self, ticket_id: &str) -> Result<Ticket, EngineError> {
        let id = Uuid::parse_str(ticket_id.trim()).map_err(|_| EngineError::InvalidTicketId)?;
        self.tickets
            .get_ticket(id)?
            .ok_or(EngineError::InvalidTicketId)
    }

    /// Verify one uploaded document and persist its verdict.
    ///
    /// Ticket-id and category checks run before any file or network work, and
    /// format errors fail before the remote call. An upload never reaches
    /// the model unless it could be accepted.
    pub async fn process_upload(
        &self,
        ticket_id: &str,
        document_type: DocumentType,
        file: &Path,
        identity: &ExpectedIdentity,
    ) -> Result<Verdict, EngineError> {
        let ticket = self.load_ticket(ticket_id)?;
        if !ticket.category.allows(document_type) {
            return Err(EngineError::DocumentTypeNotAllowed {
                document_type,
                category: ticket.category,
            });
        }

        // Bank statements travel as extracted text; everything else as a
        // normalised image frame.
        let artifact = match document_type {
            DocumentType::BankStatement => Artifact::Text(extract_pdf_text(file)?),
            _ => Artifact::Image(normalize_to_jpeg(file)?),
        };

        let record = self.extractor.extract(document_type, artifact).await?;
        let verdict = evaluate(&record, identity, &self.policy, Utc::now().date_naive());

        // Stored under a deterministic `<type>/<user>.<ext>` path rather than
        // the caller's filename, so a corrected re-upload always lands in the
        // same slot and displaces the previous record.
        let storage_link = match file.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!(
                "{document_type}/{}.{}",
                ticket.user_id,
                ext.to_ascii_lowercase()
            ),
            None => format!("{document_type}/{}", ticket.user_id),
        };
        self.documents.upsert_document(
            ticket.id,
            ticket.user_id,
            slot_key(&storage_link),
            document_type,
            &storage_link,
            verdict,
        )?;

        info!(ticket_id = %ticket.id, %document_type, %verdict, "processed upload");
        Ok(verdict)
    }

    /// The "submit all" action: mark the ticket submitted and resolve it if
    /// every uploaded document verified.
    ///
    /// Any single non-`Verified` record blocks resolution, as does a ticket
    /// with no documents at all.
    pub async fn finalize_ticket(&self, ticket_id: &str) -> Result<TicketStatus, EngineError> {
        let ticket = self.load_ticket(ticket_id)?;
        let documents = self.documents.list_documents(ticket.id)?;

        self.tickets.set_all_documents_submitted(ticket.id)?;

        let all_verified =
            !documents.is_empty() && documents.iter().all(|d| d.verdict == Verdict::Verified);
        let status = if all_verified {
            self.tickets.set_status(ticket.id, TicketStatus::Resolved)?;
            TicketStatus::Resolved
        } else {
            ticket.status
        };

        info!(ticket_id = %ticket.id, documents = documents.len(), %status, "finalised ticket");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use veridoc_core::{
        ExtractedRecord, PassportRecord, PayslipRecord, TicketCategory,
    };
    use veridoc_extract::ExtractError;
    use veridoc_store::MemoryStore;

    /// Extractor double returning a canned record and counting calls.
    struct StubExtractor {
        record: ExtractedRecord,
        calls: AtomicUsize,
    }

    impl StubExtractor {
        fn new(record: ExtractedRecord) -> Arc<Self> {
            Arc::new(Self {
                record,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FieldExtractor for StubExtractor {
        async fn extract(
            &self,
            _document_type: DocumentType,
            _artifact: Artifact,
        ) -> Result<ExtractedRecord, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.record.clone())
        }
    }

    fn valid_passport() -> ExtractedRecord {
        ExtractedRecord::Passport(PassportRecord {
            verified: true,
            first_name: "Mona".into(),
            last_name: "Lisa".into(),
            expiry_date: "2031-01-01".into(),
            nationality: "British".into(),
            passport_number: "123456789".into(),
        })
    }

    fn recent_payslip() -> ExtractedRecord {
        // Always inside the two-month window relative to the real clock.
        let date = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        ExtractedRecord::Payslip(PayslipRecord {
            verified: true,
            first_name: "Mona".into(),
            last_name: "Lisa".into(),
            date,
        })
    }

    struct Harness {
        store: Arc<MemoryStore>,
        extractor: Arc<StubExtractor>,
        engine: VerificationEngine,
    }

    fn harness(record: ExtractedRecord) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let extractor = StubExtractor::new(record);
        let engine = VerificationEngine::new(
            store.clone(),
            store.clone(),
            extractor.clone(),
            RulePolicy::default(),
        );
        Harness {
            store,
            extractor,
            engine,
        }
    }

    fn identity() -> ExpectedIdentity {
        ExpectedIdentity::new("Mona", "Lisa")
    }

    // Image path with a real decodable payload so normalisation succeeds.
    fn jpeg_fixture(dir: &Path) -> std::path::PathBuf {
        jpeg_fixture_named(dir, "upload.jpg")
    }

    fn jpeg_fixture_named(dir: &Path, name: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 180, 160]));
        img.save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn malformed_ticket_id_rejected_before_anything_else() {
        let h = harness(valid_passport());
        let err = h
            .engine
            .process_upload("not-a-uuid", DocumentType::Passport, Path::new("x.jpg"), &identity())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTicketId));
        assert_eq!(h.extractor.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_ticket_rejected() {
        let h = harness(valid_passport());
        let err = h
            .engine
            .process_upload(
                &Uuid::new_v4().to_string(),
                DocumentType::Passport,
                Path::new("x.jpg"),
                &identity(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTicketId));
    }

    #[tokio::test]
    async fn category_gate_rejects_before_extraction() {
        let h = harness(valid_passport());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Income)
            .unwrap();

        let err = h
            .engine
            .process_upload(
                &ticket.id.to_string(),
                DocumentType::Passport,
                Path::new("x.jpg"),
                &identity(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::DocumentTypeNotAllowed {
                document_type: DocumentType::Passport,
                category: TicketCategory::Income,
            }
        ));
        assert_eq!(h.extractor.calls(), 0);
    }

    #[tokio::test]
    async fn unsupported_format_fails_before_remote_call() {
        let h = harness(valid_passport());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Kyc)
            .unwrap();

        let err = h
            .engine
            .process_upload(
                &ticket.id.to_string(),
                DocumentType::Passport,
                Path::new("upload.docx"),
                &identity(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Extraction(ExtractError::UnsupportedFormat(_))
        ));
        assert_eq!(h.extractor.calls(), 0);
    }

    #[tokio::test]
    async fn verified_upload_persists_record() {
        let dir = tempfile::tempdir().unwrap();
        let file = jpeg_fixture(dir.path());

        let h = harness(valid_passport());
        let user_id = Uuid::new_v4();
        let ticket = h
            .store
            .create_ticket(user_id, TicketCategory::Kyc)
            .unwrap();

        let verdict = h
            .engine
            .process_upload(&ticket.id.to_string(), DocumentType::Passport, &file, &identity())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Verified);

        let docs = h.store.list_documents(ticket.id).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].verdict, Verdict::Verified);
        assert_eq!(docs[0].document_type, DocumentType::Passport);
        // The stored link is the per-slot path, not the upload's filename.
        assert_eq!(docs[0].storage_link, format!("Passport/{user_id}.jpg"));
        assert_eq!(h.extractor.calls(), 1);
    }

    #[tokio::test]
    async fn reupload_under_new_filename_displaces_old_record() {
        let dir = tempfile::tempdir().unwrap();
        let first = jpeg_fixture_named(dir.path(), "scan-jan.jpg");
        let second = jpeg_fixture_named(dir.path(), "scan-feb.jpg");

        let h = harness(valid_passport());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Kyc)
            .unwrap();
        let ticket_id = ticket.id.to_string();

        // First attempt fails verification (identity mismatch).
        let verdict = h
            .engine
            .process_upload(
                &ticket_id,
                DocumentType::Passport,
                &first,
                &ExpectedIdentity::new("Leonardo", "Vinci"),
            )
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::NeedsReupload);

        // The corrected upload arrives under a different filename but still
        // lands in the same slot.
        let verdict = h
            .engine
            .process_upload(&ticket_id, DocumentType::Passport, &second, &identity())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Verified);

        let docs = h.store.list_documents(ticket.id).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].verdict, Verdict::Verified);

        let status = h.engine.finalize_ticket(&ticket_id).await.unwrap();
        assert_eq!(status, TicketStatus::Resolved);
    }

    #[tokio::test]
    async fn reupload_same_slot_keeps_single_record() {
        let dir = tempfile::tempdir().unwrap();
        let file = jpeg_fixture(dir.path());

        let h = harness(valid_passport());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Kyc)
            .unwrap();
        let ticket_id = ticket.id.to_string();

        for _ in 0..2 {
            h.engine
                .process_upload(&ticket_id, DocumentType::Passport, &file, &identity())
                .await
                .unwrap();
        }
        assert_eq!(h.store.list_documents(ticket.id).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn name_mismatch_yields_reupload_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let file = jpeg_fixture(dir.path());

        let h = harness(valid_passport());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Kyc)
            .unwrap();

        let verdict = h
            .engine
            .process_upload(
                &ticket.id.to_string(),
                DocumentType::Passport,
                &file,
                &ExpectedIdentity::new("Leonardo", "Vinci"),
            )
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::NeedsReupload);
    }

    #[tokio::test]
    async fn finalize_resolves_only_when_all_verified() {
        let h = harness(recent_payslip());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Income)
            .unwrap();

        // Three verified, one needing reupload.
        for (slot, verdict) in [
            ("a", Verdict::Verified),
            ("b", Verdict::Verified),
            ("c", Verdict::Verified),
            ("d", Verdict::NeedsReupload),
        ] {
            h.store
                .upsert_document(
                    ticket.id,
                    ticket.user_id,
                    slot,
                    DocumentType::Payslip,
                    &format!("{slot}.pdf"),
                    verdict,
                )
                .unwrap();
        }

        let status = h.engine.finalize_ticket(&ticket.id.to_string()).await.unwrap();
        assert_eq!(status, TicketStatus::Pending);

        let fetched = h.store.get_ticket(ticket.id).unwrap().unwrap();
        assert!(fetched.all_documents_submitted);
        assert_eq!(fetched.status, TicketStatus::Pending);

        // Fix the failing slot and finalize again.
        h.store
            .upsert_document(
                ticket.id,
                ticket.user_id,
                "d",
                DocumentType::Payslip,
                "d.pdf",
                Verdict::Verified,
            )
            .unwrap();
        let status = h.engine.finalize_ticket(&ticket.id.to_string()).await.unwrap();
        assert_eq!(status, TicketStatus::Resolved);
        assert_eq!(
            h.store.get_ticket(ticket.id).unwrap().unwrap().status,
            TicketStatus::Resolved
        );
    }

    #[tokio::test]
    async fn finalize_with_no_documents_stays_pending() {
        let h = harness(recent_payslip());
        let ticket = h
            .store
            .create_ticket(Uuid::new_v4(), TicketCategory::Income)
            .unwrap();

        let status = h.engine.finalize_ticket(&ticket.id.to_string()).await.unwrap();
        assert_eq!(status, TicketStatus::Pending);
        assert!(
            h.store
                .get_ticket(ticket.id)
                .unwrap()
                .unwrap()
                .all_documents_submitted
        );
    }
}
