use crate::interop::handle::{Handle, Managed};
use crate::interop::string;
use crate::linphone::{Config, CoreBuilder};
use crate::sip::belle_sip_ref_counted;
use crate::sys::linphone::*;
use crate::unsafe_block;

belle_sip_ref_counted! {
    LinphoneFactory => linphone_factory_ref, linphone_factory_unref;
}

/**
The liblinphone factory, a process-wide singleton.

Every `Factory` holds its own reference, so the native singleton stays alive
while one exists even after `Factory::clean`.
 */
pub struct Factory {
    managed: Managed<LinphoneFactory>,
}

impl Factory {
    /// The factory singleton, created on first use.
    pub fn shared() -> Self {
        let managed = unsafe_block!("The singleton is live until cleaned and we take our own reference" => {
            Managed::new(linphone_factory_get())
        });

        Factory { managed }
    }

    /// Release the singleton's own reference. The next `shared` creates a new factory.
    pub fn clean() {
        unsafe_block!("Factories we handed out hold their own references" => linphone_factory_clean())
    }

    /// Parse ini text into a new configuration, `None` if it's malformed.
    pub fn create_config_from_string(&self, data: &str) -> Option<Config> {
        let data = string::to_c_string(data).ok()?;

        unsafe_block!("The configuration is new and floating" => {
            Config::from_owned(linphone_factory_create_config_from_string(self.managed.as_ptr(), data.as_ptr()))
        })
    }

    /// Start building a core.
    pub fn core_builder(&self) -> CoreBuilder<'_> {
        CoreBuilder::new(self)
    }

    /// The version of liblinphone.
    pub fn version(&self) -> String {
        crate::linphone::Core::version()
    }

    pub fn as_ptr(&self) -> *mut LinphoneFactory {
        self.managed.as_ptr()
    }
}

impl Clone for Factory {
    fn clone(&self) -> Self {
        let managed = unsafe_block!("We hold a reference so the factory is live" => Managed::new(self.managed.as_ptr()));
        Factory { managed }
    }
}
