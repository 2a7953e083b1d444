//! The factory singleton is process-wide, so its teardown gets a test binary of its own.

use belledonne::linphone::{Factory, GlobalState};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn clean_hands_out_a_new_singleton_while_old_handles_stay_valid() {
    let old = Factory::shared();
    let old_ptr = old.as_ptr();
    assert_eq!(old_ptr, Factory::shared().as_ptr());

    Factory::clean();

    // The handle kept its own reference, the old factory is still usable.
    let config = old.create_config_from_string("[sip]\nsip_port=5060\n").unwrap();
    assert_eq!(5060, config.int("sip", "sip_port", 0));

    let fresh = Factory::shared();
    assert_ne!(old_ptr, fresh.as_ptr());
    assert_eq!(fresh.as_ptr(), Factory::shared().as_ptr());

    drop(old);

    let mut core = fresh.core_builder().build().unwrap();
    let states = Rc::new(RefCell::new(Vec::new()));
    {
        let states = Rc::clone(&states);
        core.on_global_state_changed(move |state, _| states.borrow_mut().push(state));
    }
    core.iterate();
    assert_eq!(Some(&GlobalState::On), states.borrow().last());

    drop(core);
    drop(fresh);

    // Cleaning twice is harmless.
    Factory::clean();
    Factory::clean();
}
