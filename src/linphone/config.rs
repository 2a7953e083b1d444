use crate::error::Result;
use crate::interop::cow::{self, CopyOnWrite, ReferenceConvertible};
use crate::interop::status::Status;
use crate::interop::string;
use crate::sip::{belle_sip_ref_counted, BelledonneObject, ObjectReference};
use crate::sys::belle_sip::{as_object, belle_sip_object_t};
use crate::sys::linphone::*;
use crate::toolbox;
use crate::{unsafe_block, unsafe_fn};
use std::ffi::CString;
use std::fmt;
use std::path::Path;
use std::ptr;

belle_sip_ref_counted! {
    LinphoneConfig => linphone_config_ref, linphone_config_unref;
}

/**
A liblinphone configuration: ini sections of `key=value` entries.

A configuration opened from a file can be written back with `sync`. Copies
made on mutation live in memory only, they never write to the original file.
 */
#[derive(Clone)]
pub struct Config {
    internal: CopyOnWrite<ObjectReference<LinphoneConfig>>,
}

impl ReferenceConvertible for Config {
    type Reference = ObjectReference<LinphoneConfig>;

    fn internal_reference(&self) -> &CopyOnWrite<Self::Reference> {
        &self.internal
    }

    fn internal_reference_mut(&mut self) -> &mut CopyOnWrite<Self::Reference> {
        &mut self.internal
    }

    fn from_internal_reference(internal: CopyOnWrite<Self::Reference>) -> Self {
        Config { internal }
    }
}

fn path_to_c_string(path: &Path) -> Result<CString> {
    string::to_c_string(&path.to_string_lossy())
}

impl Config {
    /// An empty configuration with no file behind it.
    pub fn new() -> Self {
        unsafe_block!("A new configuration is floating and nobody else references it" => {
            cow::owned_value(linphone_config_new(ptr::null()))
        })
        .unwrap_or_else(|| panic!("`linphone_config_new` returned null without a file"))
    }

    /// A configuration backed by `path`, which doesn't have to exist yet.
    ///
    /// `None` if the file exists but is malformed.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path_to_c_string(path.as_ref()).ok()?;

        unsafe_block!("A new configuration is floating and nobody else references it" => {
            cow::owned_value(linphone_config_new(path.as_ptr()))
        })
    }

    /// Like `open`, with defaults read from `factory_path` first.
    pub fn open_with_factory(path: impl AsRef<Path>, factory_path: impl AsRef<Path>) -> Option<Self> {
        let path = path_to_c_string(path.as_ref()).ok()?;
        let factory_path = path_to_c_string(factory_path.as_ref()).ok()?;

        unsafe_block!("A new configuration is floating and nobody else references it" => {
            cow::owned_value(linphone_config_new_with_factory(path.as_ptr(), factory_path.as_ptr()))
        })
    }

    /// Parse ini text. `None` if it's malformed.
    pub fn from_buffer(buffer: &str) -> Option<Self> {
        let buffer = string::to_c_string(buffer).ok()?;

        unsafe_block!("A new configuration is floating and nobody else references it" => {
            cow::owned_value(linphone_config_new_from_buffer(buffer.as_ptr()))
        })
    }

    unsafe_fn!("`ptr` must be null or point to a new floating configuration" =>
    pub(crate) fn from_owned(ptr: *mut LinphoneConfig) -> Option<Self> {
        cow::owned_value(ptr)
    });

    /// Merge the entries of another file into this configuration.
    pub fn read_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path_to_c_string(path.as_ref())?;

        let code = unsafe_block!("The configuration is ours after any copy" => {
            linphone_config_read_file(self.internal.as_mut_ptr(), path.as_ptr())
        });

        Status::from_raw(code).into_result("linphone_config_read_file")
    }

    pub fn string(&self, section: &str, key: &str) -> Option<String> {
        let (section, key) = (string::to_c_string(section).ok()?, string::to_c_string(key).ok()?);

        unsafe_block!("The value is borrowed from the live configuration" => {
            string::from_borrowed(linphone_config_get_string(self.internal.as_ptr(), section.as_ptr(), key.as_ptr(), ptr::null()))
        })
    }

    /// An integer entry, `default` if it's absent or not a number.
    pub fn int(&self, section: &str, key: &str, default: i32) -> i32 {
        match (string::to_c_string(section), string::to_c_string(key)) {
            (Ok(section), Ok(key)) => unsafe_block!("The configuration is live" => {
                linphone_config_get_int(self.internal.as_ptr(), section.as_ptr(), key.as_ptr(), default)
            }),
            _ => default,
        }
    }

    pub fn int64(&self, section: &str, key: &str, default: i64) -> i64 {
        match (string::to_c_string(section), string::to_c_string(key)) {
            (Ok(section), Ok(key)) => unsafe_block!("The configuration is live" => {
                linphone_config_get_int64(self.internal.as_ptr(), section.as_ptr(), key.as_ptr(), default)
            }),
            _ => default,
        }
    }

    pub fn float(&self, section: &str, key: &str, default: f32) -> f32 {
        match (string::to_c_string(section), string::to_c_string(key)) {
            (Ok(section), Ok(key)) => unsafe_block!("The configuration is live" => {
                linphone_config_get_float(self.internal.as_ptr(), section.as_ptr(), key.as_ptr(), default)
            }),
            _ => default,
        }
    }

    /// Set a string entry, or remove it with `None`.
    pub fn set_string(&mut self, section: &str, key: &str, value: Option<&str>) -> Result<()> {
        let (section, key) = (string::to_c_string(section)?, string::to_c_string(key)?);
        let value = string::to_optional_c_string(value)?;

        unsafe_block!("The configuration is ours after any copy, and the strings are copied" => {
            linphone_config_set_string(self.internal.as_mut_ptr(), section.as_ptr(), key.as_ptr(), string::as_ptr_or_null(&value))
        });

        Ok(())
    }

    pub fn set_int(&mut self, section: &str, key: &str, value: i32) -> Result<()> {
        let (section, key) = (string::to_c_string(section)?, string::to_c_string(key)?);

        unsafe_block!("The configuration is ours after any copy" => {
            linphone_config_set_int(self.internal.as_mut_ptr(), section.as_ptr(), key.as_ptr(), value)
        });

        Ok(())
    }

    pub fn set_int64(&mut self, section: &str, key: &str, value: i64) -> Result<()> {
        let (section, key) = (string::to_c_string(section)?, string::to_c_string(key)?);

        unsafe_block!("The configuration is ours after any copy" => {
            linphone_config_set_int64(self.internal.as_mut_ptr(), section.as_ptr(), key.as_ptr(), value)
        });

        Ok(())
    }

    pub fn set_float(&mut self, section: &str, key: &str, value: f32) -> Result<()> {
        let (section, key) = (string::to_c_string(section)?, string::to_c_string(key)?);

        unsafe_block!("The configuration is ours after any copy" => {
            linphone_config_set_float(self.internal.as_mut_ptr(), section.as_ptr(), key.as_ptr(), value)
        });

        Ok(())
    }

    pub fn has_section(&self, section: &str) -> bool {
        let Ok(section) = string::to_c_string(section) else {
            return false;
        };

        unsafe_block!("The configuration is live" => linphone_config_has_section(self.internal.as_ptr(), section.as_ptr())) != 0
    }

    pub fn has_entry(&self, section: &str, key: &str) -> bool {
        let (Ok(section), Ok(key)) = (string::to_c_string(section), string::to_c_string(key)) else {
            return false;
        };

        unsafe_block!("The configuration is live" => {
            linphone_config_has_entry(self.internal.as_ptr(), section.as_ptr(), key.as_ptr())
        }) != 0
    }

    /// Remove a section and all its entries.
    pub fn clean_section(&mut self, section: &str) -> Result<()> {
        let section = string::to_c_string(section)?;

        unsafe_block!("The configuration is ours after any copy" => {
            linphone_config_clean_section(self.internal.as_mut_ptr(), section.as_ptr())
        });

        Ok(())
    }

    pub fn clean_entry(&mut self, section: &str, key: &str) -> Result<()> {
        let (section, key) = (string::to_c_string(section)?, string::to_c_string(key)?);

        unsafe_block!("The configuration is ours after any copy" => {
            linphone_config_clean_entry(self.internal.as_mut_ptr(), section.as_ptr(), key.as_ptr())
        });

        Ok(())
    }

    pub fn sections(&self) -> Vec<String> {
        unsafe_block!("The list is ours, the names are borrowed from the live configuration" => {
            toolbox::take_borrowed_strings(linphone_config_get_sections_names_list(self.internal.as_ptr()))
        })
    }

    pub fn keys(&self, section: &str) -> Vec<String> {
        let Ok(section) = string::to_c_string(section) else {
            return Vec::new();
        };

        unsafe_block!("The list is ours, the keys are borrowed from the live configuration" => {
            toolbox::take_borrowed_strings(linphone_config_get_keys_names_list(self.internal.as_ptr(), section.as_ptr()))
        })
    }

    /// The configuration as ini text.
    pub fn dump(&self) -> String {
        unsafe_block!("The buffer is allocated for us" => {
            string::from_owned(linphone_config_dump(self.internal.as_ptr()))
        })
        .unwrap_or_default()
    }

    /// Write the configuration back to the file it was opened from.
    ///
    /// Fails for configurations with no file, including copies.
    pub fn sync(&self) -> Result<()> {
        let code = unsafe_block!("Syncing reads the configuration and writes its file" => {
            linphone_config_sync(self.internal.as_ptr())
        });

        Status::from_raw(code).into_result("linphone_config_sync")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl BelledonneObject for Config {
    fn object_ptr(&self) -> *const belle_sip_object_t {
        as_object(self.internal.as_ptr())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Config")
            .field("sections", &self.sections())
            .field("internal", &self.internal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::cow::Provenance;

    const RC: &str = "[sip]\ncontact=sip:toto@titi\nsip_port=5060\n\n[rtp]\naudio_jitter=60.5\n";

    #[test]
    fn typed_getters() {
        let config = Config::from_buffer(RC).unwrap();

        assert_eq!(Some("sip:toto@titi".to_owned()), config.string("sip", "contact"));
        assert_eq!(5060, config.int("sip", "sip_port", 0));
        assert_eq!(5060, config.int64("sip", "sip_port", 0));
        assert_eq!(60.5, config.float("rtp", "audio_jitter", 0.0));
        assert_eq!(7, config.int("sip", "missing", 7));
        assert_eq!(7, config.int("sip", "contact", 7));
        assert_eq!(None, config.string("video", "size"));
    }

    #[test]
    fn sections_and_keys() {
        let mut config = Config::from_buffer(RC).unwrap();

        assert_eq!(vec!["sip", "rtp"], config.sections());
        assert_eq!(vec!["contact", "sip_port"], config.keys("sip"));
        assert!(config.keys("video").is_empty());
        assert!(config.has_section("rtp"));
        assert!(config.has_entry("sip", "contact"));

        config.clean_entry("sip", "contact").unwrap();
        config.clean_section("rtp").unwrap();

        assert!(!config.has_entry("sip", "contact"));
        assert!(!config.has_section("rtp"));
    }

    #[test]
    fn malformed_buffer() {
        assert!(Config::from_buffer("key_before_section=1\n").is_none());
    }

    #[test]
    fn setters_diverge_shared_copies() {
        let original = Config::from_buffer(RC).unwrap();
        let mut copy = original.clone();

        copy.set_int("sip", "sip_port", 5070).unwrap();
        copy.set_string("sip", "contact", None).unwrap();
        copy.set_float("rtp", "audio_jitter", 2.5).unwrap();

        assert_eq!(5060, original.int("sip", "sip_port", 0));
        assert_eq!(5070, copy.int("sip", "sip_port", 0));
        assert!(original.has_entry("sip", "contact"));
        assert!(!copy.has_entry("sip", "contact"));
        assert_eq!(Provenance::Copied, copy.internal.provenance());
    }

    #[test]
    fn memory_only_configs_cannot_sync() {
        let config = Config::new();

        assert!(config.sync().is_err());
        assert!(config.sections().is_empty());
    }

    #[test]
    fn dump_parses_back() {
        let mut config = Config::from_buffer(RC).unwrap();
        config.set_int64("misc", "uptime", 1 << 40).unwrap();

        let reparsed = Config::from_buffer(&config.dump()).unwrap();
        assert_eq!(1 << 40, reparsed.int64("misc", "uptime", 0));
        assert_eq!(config.sections(), reparsed.sections());
    }
}
