#![no_main]
use libfuzzer_sys::fuzz_target;

use tacopt::fuzzing::{check_against_btree, MapOp};

fuzz_target!(|ops: Vec<MapOp>| {
    let _ = env_logger::try_init();
    log::debug!("ops: {:?}", ops);
    check_against_btree(&ops[..]);
});
