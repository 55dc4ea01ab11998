//! Localized message catalog.
//!
//! Screens never hard-code user-visible strings; they ask the catalog by
//! message id. Catalogs are embedded JSON so a half-wiped device still has
//! every locale available. Lookup falls back from the exact BCP 47 tag to
//! any catalog sharing the base language, then to `en-US`, and an unknown
//! id renders as the id itself rather than dropping the line.

use std::collections::HashMap;

const EN_US: &str = r##"{
    "title": "<title><b>Lifeboat recovery</b>",
    "menu.hint": "<dim>Volume keys move, power selects.",
    "menu.reboot": "Reboot system now",
    "menu.apply": "Apply update from storage",
    "menu.sideload": "Apply update from host",
    "menu.wipe_data": "Wipe data / factory reset",
    "menu.wipe_cache": "Wipe cache partition",
    "menu.power_off": "Power off",
    "install.package": "Installing package",
    "install.success": "<success>Install complete.",
    "install.failed": "<error>Install failed.",
    "wipe.data": "Wiping data...",
    "wipe.cache": "Wiping cache...",
    "wipe.done": "<success>Wipe complete.",
    "sideload.waiting": "Waiting for a package from the host...",
    "media.none": "<warning>No update packages found on storage.",
    "restore.noted": "Data restore archive recorded for the main system.",
    "reboot.now": "Rebooting...",
    "error.device": "Display or input device unavailable.",
    "error.format": "Unsupported framebuffer pixel format.",
    "error.mount": "Failed to mount storage volume.",
    "error.storage_full": "Not enough free space on the target volume.",
    "error.verify": "Package signature verification failed.",
    "error.corrupt": "Update package is corrupt.",
    "error.config": "Invalid configuration value.",
    "error.install": "Installation step failed.",
    "error.io": "I/O error."
}"##;

const ES_ES: &str = r##"{
    "title": "<title><b>Consola de recuperación Lifeboat</b>",
    "menu.hint": "<dim>Volumen mueve, encendido selecciona.",
    "menu.reboot": "Reiniciar el sistema",
    "menu.apply": "Instalar desde el almacenamiento",
    "menu.sideload": "Instalar desde el equipo",
    "menu.wipe_data": "Borrar datos / restablecer",
    "menu.wipe_cache": "Borrar la caché",
    "menu.power_off": "Apagar",
    "install.package": "Instalando el paquete",
    "install.success": "<success>Instalación completada.",
    "install.failed": "<error>Error en la instalación.",
    "wipe.data": "Borrando datos...",
    "wipe.cache": "Borrando la caché...",
    "wipe.done": "<success>Borrado completado.",
    "sideload.waiting": "Esperando un paquete del equipo...",
    "media.none": "<warning>No hay paquetes en el almacenamiento.",
    "restore.noted": "Archivo de restauración registrado para el sistema.",
    "reboot.now": "Reiniciando...",
    "error.device": "Pantalla o entrada no disponible.",
    "error.format": "Formato de píxel no compatible.",
    "error.mount": "No se pudo montar el volumen.",
    "error.storage_full": "Espacio insuficiente en el volumen.",
    "error.verify": "Falló la verificación de la firma.",
    "error.corrupt": "El paquete está dañado.",
    "error.config": "Valor de configuración no válido.",
    "error.install": "Falló un paso de la instalación.",
    "error.io": "Error de E/S."
}"##;

const CATALOGS: [(&str, &str); 2] = [("en-US", EN_US), ("es-ES", ES_ES)];
const FALLBACK_LOCALE: &str = "en-US";

/// One locale's id-to-text table.
pub struct MessageCatalog {
    locale: String,
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    /// Load the catalog for a BCP 47 tag, falling back by base language
    /// and finally to `en-US`.
    pub fn for_locale(tag: &str) -> MessageCatalog {
        for (name, json) in CATALOGS {
            if name.eq_ignore_ascii_case(tag) {
                return Self::from_json(name, json);
            }
        }
        let base = base_language(tag);
        for (name, json) in CATALOGS {
            if base_language(name).eq_ignore_ascii_case(base) {
                log::info!("no catalog for {tag:?}; using {name}");
                return Self::from_json(name, json);
            }
        }
        log::info!("no catalog for {tag:?}; using {FALLBACK_LOCALE}");
        Self::from_json(FALLBACK_LOCALE, EN_US)
    }

    fn from_json(name: &str, json: &str) -> MessageCatalog {
        let messages = serde_json::from_str(json).unwrap_or_else(|e| {
            log::error!("embedded catalog {name} is invalid: {e}");
            HashMap::new()
        });
        MessageCatalog {
            locale: name.to_string(),
            messages,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Look up a message. Unknown ids render as themselves so a missing
    /// translation is visible on screen instead of a blank line.
    pub fn get<'a>(&'a self, id: &'a str) -> &'a str {
        self.messages.get(id).map(String::as_str).unwrap_or(id)
    }
}

fn base_language(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}
