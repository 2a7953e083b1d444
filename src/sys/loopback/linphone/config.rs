use super::{linphone_refcounting, status};
use crate::sys::loopback::belle_sip::{
    as_object, belle_sip_object_t, belle_sip_object_vptr_t, object_destroy, object_new,
};
use crate::sys::loopback::log::{native_log, BCTBX_LOG_ERROR, BCTBX_LOG_WARNING};
use crate::sys::loopback::toolbox::{bctbx_list_append, bctbx_list_t};
use crate::sys::loopback::{alloc_c_string, c_string, copy_c_string, read_c_string};
use libc::{c_char, c_float, c_int, c_void};
use std::ffi::CString;
use std::fmt::Write;
use std::str::FromStr;
use std::{fs, ptr};

struct Section {
    name: CString,
    entries: Vec<(CString, CString)>,
}

/// An ini document: `[section]` headers, `key=value` entries and `#` comments.
#[repr(C)]
pub struct LinphoneConfig {
    base: belle_sip_object_t,
    filename: Option<String>,
    sections: Vec<Section>,
}

static CONFIG_VPTR: belle_sip_object_vptr_t = belle_sip_object_vptr_t {
    type_name: "LinphoneConfig",
    clone: config_clone,
    marshal: config_marshal,
    destroy: object_destroy::<LinphoneConfig>,
};

impl LinphoneConfig {
    fn empty(filename: Option<String>) -> Self {
        LinphoneConfig {
            base: belle_sip_object_t::new(&CONFIG_VPTR),
            filename,
            sections: Vec::new(),
        }
    }

    /// Merge an ini document into this one, entries already present are overwritten.
    fn merge(&mut self, text: &str) -> Result<(), usize> {
        let mut current: Option<CString> = None;

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|line| line.strip_suffix(']')) {
                let name = c_string(name.trim());
                self.section_mut(&name);
                current = Some(name);
                continue;
            }

            match (line.split_once('='), &current) {
                (Some((key, value)), Some(section)) => {
                    let section = section.clone();
                    self.set(section, c_string(key.trim()), Some(c_string(value.trim())));
                }
                _ => return Err(number + 1),
            }
        }

        Ok(())
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name.to_bytes() == name.as_bytes())
    }

    fn section_mut(&mut self, name: &CString) -> &mut Section {
        let index = match self.sections.iter().position(|section| section.name == *name) {
            Some(index) => index,
            None => {
                self.sections.push(Section {
                    name: name.clone(),
                    entries: Vec::new(),
                });

                self.sections.len() - 1
            }
        };

        &mut self.sections[index]
    }

    fn get(&self, section: &str, key: &str) -> Option<&CString> {
        self.section(section)?
            .entries
            .iter()
            .find(|(entry, _)| entry.to_bytes() == key.as_bytes())
            .map(|(_, value)| value)
    }

    fn set(&mut self, section: CString, key: CString, value: Option<CString>) {
        let entries = &mut self.section_mut(&section).entries;

        match value {
            Some(value) => match entries.iter_mut().find(|(entry, _)| *entry == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            },
            None => entries.retain(|(entry, _)| *entry != key),
        }
    }

    fn dump(&self) -> String {
        let mut out = String::new();

        for section in &self.sections {
            let _ = writeln!(out, "[{}]", section.name.to_string_lossy());

            for (key, value) in &section.entries {
                let _ = writeln!(out, "{}={}", key.to_string_lossy(), value.to_string_lossy());
            }

            out.push('\n');
        }

        out
    }

    fn read_file(&mut self, filename: &str) -> bool {
        let text = match fs::read_to_string(filename) {
            Ok(text) => text,
            Err(e) => {
                native_log!("liblinphone", BCTBX_LOG_WARNING, "cannot read config file {}: {}", filename, e);
                return false;
            }
        };

        match self.merge(&text) {
            Ok(()) => true,
            Err(line) => {
                native_log!("liblinphone", BCTBX_LOG_ERROR, "malformed config file {} at line {}", filename, line);
                false
            }
        }
    }
}

unsafe fn config_clone(obj: *const belle_sip_object_t) -> *mut belle_sip_object_t {
    let config = &*(obj as *const LinphoneConfig);

    let mut copy = LinphoneConfig::empty(None);
    for section in &config.sections {
        copy.sections.push(Section {
            name: section.name.clone(),
            entries: section.entries.clone(),
        });
    }

    as_object(object_new(copy))
}

unsafe fn config_marshal(obj: *const belle_sip_object_t, out: &mut String) {
    out.push_str(&(*(obj as *const LinphoneConfig)).dump())
}

linphone_refcounting! {
    LinphoneConfig => linphone_config_ref, linphone_config_unref;
}

/// A configuration backed by `filename`, which doesn't have to exist yet.
///
/// Returns null if the file exists but is malformed.
pub unsafe extern "C" fn linphone_config_new(filename: *const c_char) -> *mut LinphoneConfig {
    linphone_config_new_with_factory(filename, ptr::null())
}

/// Like `linphone_config_new`, with defaults read from `factory_filename` first.
pub unsafe extern "C" fn linphone_config_new_with_factory(
    filename: *const c_char,
    factory_filename: *const c_char,
) -> *mut LinphoneConfig {
    let filename = read_c_string(filename);
    let mut config = LinphoneConfig::empty(filename.clone());

    if let Some(factory) = read_c_string(factory_filename) {
        if !config.read_file(&factory) {
            return ptr::null_mut();
        }
    }

    if let Some(filename) = filename {
        let exists = fs::metadata(&filename).is_ok();
        if exists && !config.read_file(&filename) {
            return ptr::null_mut();
        }
    }

    object_new(config)
}

/// A configuration with no file behind it. Returns null if `buffer` is malformed.
pub unsafe extern "C" fn linphone_config_new_from_buffer(buffer: *const c_char) -> *mut LinphoneConfig {
    let Some(buffer) = read_c_string(buffer) else {
        return ptr::null_mut();
    };

    let mut config = LinphoneConfig::empty(None);
    match config.merge(&buffer) {
        Ok(()) => object_new(config),
        Err(line) => {
            native_log!("liblinphone", BCTBX_LOG_ERROR, "malformed config buffer at line {}", line);
            ptr::null_mut()
        }
    }
}

/// Merge another file into the configuration.
pub unsafe extern "C" fn linphone_config_read_file(config: *mut LinphoneConfig, filename: *const c_char) -> c_int {
    match read_c_string(filename) {
        Some(filename) => status((*config).read_file(&filename)),
        None => -1,
    }
}

/// A string entry, borrowed from the configuration. `default_string` if absent.
pub unsafe extern "C" fn linphone_config_get_string(
    config: *const LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    default_string: *const c_char,
) -> *const c_char {
    match (read_c_string(section), read_c_string(key)) {
        (Some(section), Some(key)) => (*config)
            .get(&section, &key)
            .map(|value| value.as_ptr())
            .unwrap_or(default_string),
        _ => default_string,
    }
}

unsafe fn parsed<T: FromStr>(config: *const LinphoneConfig, section: *const c_char, key: *const c_char) -> Option<T> {
    let (section, key) = (read_c_string(section)?, read_c_string(key)?);
    let value = (*config).get(&section, &key)?;

    value.to_str().ok()?.trim().parse().ok()
}

pub unsafe extern "C" fn linphone_config_get_int(
    config: *const LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    default_value: c_int,
) -> c_int {
    parsed(config, section, key).unwrap_or(default_value)
}

pub unsafe extern "C" fn linphone_config_get_int64(
    config: *const LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    default_value: i64,
) -> i64 {
    parsed(config, section, key).unwrap_or(default_value)
}

pub unsafe extern "C" fn linphone_config_get_float(
    config: *const LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    default_value: c_float,
) -> c_float {
    parsed(config, section, key).unwrap_or(default_value)
}

/// Set a string entry, removing it when `value` is null.
pub unsafe extern "C" fn linphone_config_set_string(
    config: *mut LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    value: *const c_char,
) {
    if let (Some(section), Some(key)) = (copy_c_string(section), copy_c_string(key)) {
        (*config).set(section, key, copy_c_string(value));
    }
}

unsafe fn set_display(config: *mut LinphoneConfig, section: *const c_char, key: *const c_char, value: impl ToString) {
    if let (Some(section), Some(key)) = (copy_c_string(section), copy_c_string(key)) {
        (*config).set(section, key, Some(c_string(&value.to_string())));
    }
}

pub unsafe extern "C" fn linphone_config_set_int(
    config: *mut LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    value: c_int,
) {
    set_display(config, section, key, value)
}

pub unsafe extern "C" fn linphone_config_set_int64(
    config: *mut LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    value: i64,
) {
    set_display(config, section, key, value)
}

pub unsafe extern "C" fn linphone_config_set_float(
    config: *mut LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
    value: c_float,
) {
    set_display(config, section, key, value)
}

pub unsafe extern "C" fn linphone_config_has_section(config: *const LinphoneConfig, section: *const c_char) -> c_int {
    let found = read_c_string(section).map_or(false, |section| (*config).section(&section).is_some());
    c_int::from(found)
}

pub unsafe extern "C" fn linphone_config_has_entry(
    config: *const LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
) -> c_int {
    let found = match (read_c_string(section), read_c_string(key)) {
        (Some(section), Some(key)) => (*config).get(&section, &key).is_some(),
        _ => false,
    };

    c_int::from(found)
}

/// Remove a section and all its entries.
pub unsafe extern "C" fn linphone_config_clean_section(config: *mut LinphoneConfig, section: *const c_char) {
    if let Some(section) = copy_c_string(section) {
        (*config).sections.retain(|existing| existing.name != section);
    }
}

pub unsafe extern "C" fn linphone_config_clean_entry(
    config: *mut LinphoneConfig,
    section: *const c_char,
    key: *const c_char,
) {
    if let (Some(section), Some(key)) = (copy_c_string(section), copy_c_string(key)) {
        if (*config).sections.iter().any(|existing| existing.name == section) {
            (*config).set(section, key, None);
        }
    }
}

/// The ini text, owned by the caller.
pub unsafe extern "C" fn linphone_config_dump(config: *const LinphoneConfig) -> *mut c_char {
    alloc_c_string(&(*config).dump())
}

/// Write the configuration back to its file. Fails if it has none.
pub unsafe extern "C" fn linphone_config_sync(config: *mut LinphoneConfig) -> c_int {
    let Some(filename) = (*config).filename.as_ref() else {
        native_log!("liblinphone", BCTBX_LOG_WARNING, "config has no file to sync to");
        return -1;
    };

    match fs::write(filename, (*config).dump()) {
        Ok(()) => 0,
        Err(e) => {
            native_log!("liblinphone", BCTBX_LOG_ERROR, "cannot write config file {}: {}", filename, e);
            -1
        }
    }
}

/// The section names. The list is owned by the caller, the strings are borrowed.
pub unsafe extern "C" fn linphone_config_get_sections_names_list(config: *const LinphoneConfig) -> *mut bctbx_list_t {
    let mut list = ptr::null_mut();

    for section in &(*config).sections {
        list = bctbx_list_append(list, section.name.as_ptr() as *mut c_void);
    }

    list
}

/// The keys of a section. The list is owned by the caller, the strings are borrowed.
pub unsafe extern "C" fn linphone_config_get_keys_names_list(
    config: *const LinphoneConfig,
    section: *const c_char,
) -> *mut bctbx_list_t {
    let mut list = ptr::null_mut();

    if let Some(section) = read_c_string(section).and_then(|section| (*config).section(&section)) {
        for (key, _) in &section.entries {
            list = bctbx_list_append(list, key.as_ptr() as *mut c_void);
        }
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::loopback::toolbox::{bctbx_list_free, bctbx_list_nth_data, bctbx_list_size};
    use std::ffi::CStr;

    const RC: &str = "# linphonerc\n[sip]\ncontact=sip:toto@titi\nsip_port=5060\n\n[rtp]\naudio_jitter=60.5\n";

    fn c(value: &str) -> CString {
        CString::new(value).unwrap()
    }

    fn from_buffer(buffer: &str) -> *mut LinphoneConfig {
        unsafe { linphone_config_new_from_buffer(c(buffer).as_ptr()) }
    }

    unsafe fn string(config: *const LinphoneConfig, section: &str, key: &str) -> Option<String> {
        let value = linphone_config_get_string(config, c(section).as_ptr(), c(key).as_ptr(), ptr::null());
        if value.is_null() {
            None
        } else {
            Some(CStr::from_ptr(value).to_string_lossy().into_owned())
        }
    }

    #[test]
    fn typed_getters() {
        unsafe {
            let config = from_buffer(RC);
            assert!(!config.is_null());

            assert_eq!(Some("sip:toto@titi".to_owned()), string(config, "sip", "contact"));
            assert_eq!(5060, linphone_config_get_int(config, c("sip").as_ptr(), c("sip_port").as_ptr(), 0));
            assert_eq!(7, linphone_config_get_int(config, c("sip").as_ptr(), c("missing").as_ptr(), 7));
            assert_eq!(60.5, linphone_config_get_float(config, c("rtp").as_ptr(), c("audio_jitter").as_ptr(), 0.0));
            assert_eq!(None, string(config, "video", "size"));

            linphone_config_unref(config);
        }
    }

    #[test]
    fn malformed_buffers() {
        assert!(from_buffer("contact=sip:toto@titi\n").is_null());
        assert!(from_buffer("[sip]\nnot an entry\n").is_null());
        assert!(!from_buffer("").is_null());
    }

    #[test]
    fn setters_and_cleaning() {
        unsafe {
            let config = from_buffer(RC);

            linphone_config_set_int(config, c("sip").as_ptr(), c("sip_port").as_ptr(), 5070);
            linphone_config_set_string(config, c("video").as_ptr(), c("size").as_ptr(), c("qcif").as_ptr());
            assert_eq!(Some("5070".to_owned()), string(config, "sip", "sip_port"));
            assert_eq!(1, linphone_config_has_section(config, c("video").as_ptr()));

            linphone_config_clean_entry(config, c("sip").as_ptr(), c("contact").as_ptr());
            assert_eq!(0, linphone_config_has_entry(config, c("sip").as_ptr(), c("contact").as_ptr()));

            linphone_config_clean_section(config, c("rtp").as_ptr());
            assert_eq!(0, linphone_config_has_section(config, c("rtp").as_ptr()));

            linphone_config_unref(config);
        }
    }

    #[test]
    fn section_names_are_borrowed() {
        unsafe {
            let config = from_buffer(RC);
            let names = linphone_config_get_sections_names_list(config);

            assert_eq!(2, bctbx_list_size(names));
            let second = CStr::from_ptr(bctbx_list_nth_data(names, 1) as *const c_char);
            assert_eq!("rtp", second.to_str().unwrap());

            bctbx_list_free(names);
            linphone_config_unref(config);
        }
    }

    #[test]
    fn dump_parses_back() {
        unsafe {
            let config = from_buffer(RC);

            let dumped = linphone_config_dump(config);
            let reparsed = linphone_config_new_from_buffer(dumped);
            libc::free(dumped as *mut c_void);

            assert_eq!(Some("sip:toto@titi".to_owned()), string(reparsed, "sip", "contact"));

            linphone_config_unref(config);
            linphone_config_unref(reparsed);
        }
    }

    #[test]
    fn sync_needs_a_file() {
        unsafe {
            let config = from_buffer(RC);
            assert_eq!(-1, linphone_config_sync(config));
            linphone_config_unref(config);
        }
    }
}
