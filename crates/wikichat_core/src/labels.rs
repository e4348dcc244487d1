//! User-visible strings. The backend answers in Spanish, so the client does too.

use crate::{Failure, OpsAction};

pub const EXPORT_FILENAME: &str = "chroma_index.zip";
pub const WIPE_PROMPT: &str = "¿Borrar la colección completa?";

pub(crate) const TYPING: &str = "Procesando…";
pub(crate) const NETWORK_ERROR: &str = "Error de red.";
pub(crate) const UNKNOWN_ERROR: &str = "desconocido";
const EXPORT_ERROR: &str = "Error al exportar";
pub(crate) const UPLOADED: &str = "PDF subido.";
pub(crate) const EXPORTED: &str = "Exportado.";

pub(crate) fn in_flight(action: OpsAction) -> Option<&'static str> {
    match action {
        OpsAction::Upload => Some("Subiendo..."),
        OpsAction::Index => Some("Indexando..."),
        OpsAction::Wipe => None,
        OpsAction::Export => Some("Exportando índice..."),
        OpsAction::Import => Some("Importando índice..."),
    }
}

pub(crate) fn save_failed(detail: &str) -> String {
    format!("Error al guardar: {detail}")
}

pub(crate) fn indexed(pages: u64, chunks: u64) -> String {
    format!("Indexado: páginas={pages}, chunks={chunks}")
}

/// Text shown for a failed request, in the transcript or the status line.
pub fn describe_failure(failure: &Failure) -> String {
    match failure {
        Failure::Network => NETWORK_ERROR.to_string(),
        Failure::Application(detail) => {
            let detail = detail
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(UNKNOWN_ERROR);
            format!("Error: {detail}")
        }
        // Only export lacks a JSON contract, so a bare status is always an export failure.
        Failure::HttpStatus(_) => EXPORT_ERROR.to_string(),
        Failure::Local(detail) => format!("Error: {detail}"),
    }
}

pub(crate) fn typing(frame: u8) -> String {
    let dots = usize::from(frame % 4);
    format!("{TYPING}{}{}", ".".repeat(dots), " ".repeat(3 - dots))
}
