//! Walkthrough of advice chains and the event bus.
//!
//! Run with `SKEIN_LOGGING__LEVEL=debug` to see every signal as it changes
//! control flow, or `trace` to follow each chain node.

use std::sync::Arc;

use serde_json::json;
use skein::prelude::*;
use tracing::info;

/// Context handed to advice callbacks.
struct Label(&'static str);

/// An object whose `on` method gets wrapped.
#[derive(Default)]
struct Sandbox {
    bus: EventBus,
}

impl Sandbox {
    /// `on(event_type, message)`: subscribes a listener printing `message`.
    fn on(&self, args: &[Value]) -> InvokeResult {
        let event_type = args
            .first()
            .and_then(Value::as_str)
            .ok_or("on: expected an event type")?;
        let message = args
            .get(1)
            .and_then(Value::as_str)
            .unwrap_or(event_type)
            .to_string();

        println!("sandbox on ... {event_type}");
        self.bus.on(event_type, move |_| println!("{message}"));
        Ok(Value::from(self.bus.subscriber_count()))
    }
}

impl Resolve for Sandbox {
    fn resolve(&self, name: &str) -> Option<Operation<Self>> {
        match name {
            "on" => Some(Self::on as Operation<Self>),
            _ => None,
        }
    }
}

fn main() -> Result<(), BoxError> {
    let config = ConfigLoader::new().load()?;
    logging::init_from_config(&config.logging);

    layered_handler(&config)?;
    event_bus();
    wrapped_method()?;

    Ok(())
}

fn layered_handler(config: &SkeinConfig) -> Result<(), BoxError> {
    let app = Method::from_fn("handle", |args| {
        println!("{}", Value::Array(args.to_vec()));
        println!("hi app");
        Ok(json!("hello world"))
    });
    let mut h = Handler::with_options(app, config.chain.handler_options("app"));

    // Added then removed again: neither wraps the final chain.
    let around = |label: &Label, jp: &Joinpoint<'_>| -> InvokeResult {
        println!("{}", label.0);
        let result = jp.proceed()?;
        println!("{}", label.0);
        Ok(result)
    };
    let around1 = Advice::new(Label("app around 1"), Callback::around(around), Mode::AROUND)?
        .name("app around 1");
    let around2 = Advice::new(Label("app around 2"), Callback::around(around), Mode::AROUND)?
        .name("app around 2");
    h.add(around1.clone())?;
    h.add(around2.clone())?;
    h.remove(&around2);
    h.remove(&around1);

    h.after(
        |label: &Label, _: &Joinpoint<'_>| {
            println!("{}", label.0);
            Ok(None)
        },
        Label("app after 1"),
    )?;
    h.after(
        |_: &(), _: &Joinpoint<'_>| {
            println!("after...do some thing...");
            Ok(Some(Signal::halt("dd", 789)))
        },
        (),
    )?;
    h.inject(
        Mode::BEFORE | Mode::AFTER,
        Callback::hook(|_: &(), jp: &Joinpoint<'_>| {
            println!("inject {:?}.", jp.phase());
            Ok(None)
        }),
        (),
    )?;
    h.before(
        |label: &Label, _: &Joinpoint<'_>| {
            println!("{}", label.0);
            Ok(None)
        },
        Label("app before 1"),
    )?;

    println!("{h:?}");
    let result = h.exec(&[json!(1), json!(2), json!(3)])?;
    println!("{result}");
    info!(handler = h.name(), %result, "Handler finished");

    Ok(())
}

fn event_bus() {
    println!("\n----------- EventBus");

    let sandbox = EventBus::new();
    sandbox.on("post:click", |_| println!("post:click"));
    sandbox.once("post:click", |_| println!("once1 post:click"));
    sandbox.once("post:click", |_| println!("once2 post:click"));

    sandbox.fire("post:click", &Value::Null);
    sandbox.fire("post:click", &Value::Null);
}

fn wrapped_method() -> Result<(), BoxError> {
    println!("\n----------- Wrapped method");

    let sandbox = Arc::new(Sandbox::default());
    let mut hm = Handler::for_method(Arc::clone(&sandbox), "on")?;

    hm.after(
        |_: &(), _: &Joinpoint<'_>| {
            println!("after ...");
            Ok(None)
        },
        (),
    )?;
    hm.before(
        |_: &(), _: &Joinpoint<'_>| {
            println!("before ...");
            Ok(None)
        },
        (),
    )?;
    hm.around(
        |_: &(), jp: &Joinpoint<'_>| {
            println!("around ...");
            let result = jp.proceed()?;
            println!("around ...");
            Ok(result)
        },
        (),
    )?;

    hm.exec(&[json!("post:change"), json!("hm - post:change ...")])?;
    hm.exec(&[json!("post:click"), json!("hm - post:click ...")])?;
    sandbox
        .bus
        .once("post:click", |_| println!("once -- post:click"));
    hm.exec(&[json!(":click"), json!("hm - :click ...")])?;

    sandbox.bus.fire(":click", &Value::Null);
    println!("-------------- fire again!");
    sandbox.bus.fire(":click", &Value::Null);

    Ok(())
}
