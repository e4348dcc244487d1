pub const TYPING_TICK_MS: u64 = 400;

pub const USER_LABEL: &str = "tú";
pub const ASSISTANT_LABEL: &str = "wiki";
pub const STATUS_LABEL: &str = "ops";
pub const PROMPT: &str = "> ";
pub const CONFIRM_SUFFIX: &str = " [s/N] ";

pub const BUSY_NOTICE: &str = "Esperá la respuesta anterior.";

pub const HELP: &str = "\
Escribí una pregunta y Enter para consultar la wiki.
Comandos:
  /k <n>            cantidad de fragmentos por pregunta
  /upload [ruta]    subir un PDF
  /index            indexar los PDFs del servidor
  /wipe             borrar la colección completa
  /export           descargar el índice como chroma_index.zip
  /import [ruta]    restaurar un índice desde un .zip
  /help             esta ayuda
  /quit             salir";
