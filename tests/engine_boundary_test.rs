/*!
 * Engine Boundary Tests
 * Verifies how the dispatcher drives a scripting engine, using a mocked engine
 */

use deferred_callbacks::{CallbackTable, Context, ScriptEngine};
use mockall::predicate::eq;
use mockall::{mock, Sequence};
use std::rc::Rc;

/// Script values are plain ids; 0 is `undefined`
type Value = u32;

const UNDEFINED: Value = 0;
const CALLBACK: Value = 7;

mock! {
    pub Engine {}

    impl ScriptEngine for Engine {
        type Value = u32;
        type Error = String;

        fn undefined(&self) -> u32;
        fn is_function(&self, value: &u32) -> bool;
        fn call(&self, function: &u32, this: &u32, args: &[u32]) -> Result<u32, String>;
    }
}

fn table(engine: MockEngine) -> CallbackTable<MockEngine> {
    CallbackTable::with_defaults(engine).unwrap()
}

#[test]
fn test_call_uses_undefined_receiver_and_hook_arguments() {
    let mut engine = MockEngine::new();
    let mut seq = Sequence::new();

    engine
        .expect_is_function()
        .with(eq(CALLBACK))
        .times(1)
        .in_sequence(&mut seq)
        .return_const(true);
    engine
        .expect_undefined()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(UNDEFINED);
    engine
        .expect_call()
        .withf(|function, this, args| {
            *function == CALLBACK && *this == UNDEFINED && args == [11u32, 12u32].as_slice()
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _| Ok(99));

    let table = table(engine);
    let returned = Rc::new(std::cell::Cell::new(0));
    let returned_in = returned.clone();

    let handle = table
        .register_scripted(
            &CALLBACK,
            Context::empty(),
            Some(Rc::new(|_: &Context| vec![11u32, 12])),
            Some(Rc::new(move |_: &Context, ret: &Value| returned_in.set(*ret))),
        )
        .unwrap();

    table.signal(handle);
    let report = table.service();

    assert_eq!(report.invoked, 1);
    assert_eq!(returned.get(), 99);
}

#[test]
fn test_non_callable_never_reaches_call() {
    let mut engine = MockEngine::new();
    engine.expect_is_function().times(1).return_const(false);
    engine.expect_undefined().never();
    engine.expect_call().never();

    let table = table(engine);
    let handle = table
        .register_scripted(&CALLBACK, Context::empty(), None, None)
        .unwrap();

    table.signal(handle);
    let report = table.service();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.invoked, 0);
}

#[test]
fn test_engine_error_does_not_stop_pass() {
    let mut engine = MockEngine::new();
    engine.expect_is_function().return_const(true);
    engine.expect_undefined().return_const(UNDEFINED);
    engine
        .expect_call()
        .with(eq(1u32), eq(UNDEFINED), mockall::predicate::always())
        .times(1)
        .returning(|_, _, _| Err("TypeError".to_string()));
    engine
        .expect_call()
        .with(eq(2u32), eq(UNDEFINED), mockall::predicate::always())
        .times(1)
        .returning(|_, _, _| Ok(UNDEFINED));

    let table = table(engine);
    let first = table
        .register_scripted(&1, Context::empty(), None, None)
        .unwrap();
    let second = table
        .register_scripted(&2, Context::empty(), None, None)
        .unwrap();

    table.signal(first);
    table.signal(second);
    let report = table.service();

    assert_eq!(report.failed, 1);
    assert_eq!(report.invoked, 1);
}

#[test]
fn test_unsignaled_table_never_touches_engine() {
    let mut engine = MockEngine::new();
    engine.expect_is_function().never();
    engine.expect_call().never();

    let table = table(engine);
    table
        .register_scripted(&CALLBACK, Context::empty(), None, None)
        .unwrap();

    for _ in 0..3 {
        assert_eq!(table.service().serviced(), 0);
    }
}
