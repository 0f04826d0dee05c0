//! Callables registered on the template engine.
//!
//! Data-bound predicates close over the render's data context; random
//! generators share the render's own [`FuzzGenerator`] behind a mutex.

use crate::fixtures::FixtureStore;
use crate::generator::{data, FuzzGenerator};
use crate::lookup::{find_variable, variable_contains, variable_equals, variable_number, variable_size};
use crate::value::Value;
use chrono::{Local, SecondsFormat};
use parking_lot::Mutex;
use rand::Rng;
use rhai::{Array, Dynamic, Engine, EvalAltResult, Map};
use std::fmt::Write;
use std::sync::Arc;
use tracing::warn;

/// Key holding the number of requests seen so far for a scenario.
pub const REQUEST_COUNT_KEY: &str = "_RequestCount";

/// State shared by every callable of one render.
#[derive(Clone)]
pub(crate) struct FunctionContext {
    pub data: Arc<Value>,
    pub generator: Arc<Mutex<FuzzGenerator>>,
    pub fixtures: FixtureStore,
}

pub(crate) fn create_engine(ctx: &FunctionContext, max_operations: u64) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_operations(max_operations);
    engine.set_max_expr_depths(64, 32);

    register_lookup(&mut engine, ctx);
    register_request(&mut engine, ctx);
    register_random(&mut engine, ctx);
    register_arithmetic(&mut engine);
    register_time(&mut engine);
    register_fixtures(&mut engine, ctx);
    engine
}

fn register_lookup(engine: &mut Engine, ctx: &FunctionContext) {
    let data = ctx.data.clone();
    engine.register_fn("Data", move || value_to_dynamic((*data).clone()));

    let data = ctx.data.clone();
    engine.register_fn("FindVariable", move |name: &str| {
        find_variable(name, &data).map_or(Dynamic::UNIT, value_to_dynamic)
    });

    let data = ctx.data.clone();
    engine.register_fn("VariableEquals", move |name: &str, target: Dynamic| {
        variable_equals(name, &to_text(&target), &data)
    });

    for fn_name in ["VariableContains", "VariableMatches"] {
        let data = ctx.data.clone();
        engine.register_fn(fn_name, move |name: &str, target: Dynamic| {
            variable_contains(name, &to_text(&target), &data)
        });
    }

    let data = ctx.data.clone();
    engine.register_fn("VariableNumber", move |name: &str| variable_number(name, &data));

    let data = ctx.data.clone();
    engine.register_fn("VariableSize", move |name: &str| variable_size(name, &data));

    let data = ctx.data.clone();
    engine.register_fn("VariableSizeEQ", move |name: &str, size: Dynamic| {
        variable_size(name, &data) == to_int(&size)
    });
    let data = ctx.data.clone();
    engine.register_fn("VariableSizeLE", move |name: &str, size: Dynamic| {
        variable_size(name, &data) <= to_int(&size)
    });
    let data = ctx.data.clone();
    engine.register_fn("VariableSizeGE", move |name: &str, size: Dynamic| {
        variable_size(name, &data) >= to_int(&size)
    });

    let data = ctx.data.clone();
    engine.register_fn("NumPropertyEQ", move |name: &str, n: Dynamic| {
        variable_number(name, &data) == to_float(&n)
    });
    let data = ctx.data.clone();
    engine.register_fn("NumPropertyLE", move |name: &str, n: Dynamic| {
        variable_number(name, &data) <= to_float(&n)
    });
    let data = ctx.data.clone();
    engine.register_fn("NumPropertyGE", move |name: &str, n: Dynamic| {
        variable_number(name, &data) >= to_float(&n)
    });

    let data = ctx.data.clone();
    engine.register_fn("HasProperty", move |name: &str| {
        find_variable(name, &data).is_some()
    });
}

fn register_request(engine: &mut Engine, ctx: &FunctionContext) {
    let data = ctx.data.clone();
    engine.register_fn("ResponseStatusMatches", move |status: Dynamic| {
        variable_contains("status", &to_text(&status), &data)
    });

    let data = ctx.data.clone();
    engine.register_fn("ResponseTimeMillisLE", move |millis: Dynamic| {
        find_variable("elapsed", &data).is_some()
            && variable_number("elapsed", &data) <= to_float(&millis)
    });

    let data = ctx.data.clone();
    engine.register_fn("LTRequest", move |n: Dynamic| {
        let count = request_count(&data);
        count >= 0 && count < to_int(&n)
    });

    let data = ctx.data.clone();
    engine.register_fn("GERequest", move |n: Dynamic| {
        let count = request_count(&data);
        count >= 0 && count >= to_int(&n)
    });

    let data = ctx.data.clone();
    engine.register_fn("NthRequest", move |n: Dynamic| {
        let count = request_count(&data);
        count >= 0 && count.checked_rem(to_int(&n)) == Some(0)
    });
}

fn register_random(engine: &mut Engine, ctx: &FunctionContext) {
    let g = ctx.generator.clone();
    engine.register_fn("RandIntMinMax", move |min: Dynamic, max: Dynamic| {
        data::rand_int_min_max(g.lock().rng_mut(), to_int(&min), to_int(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandIntMax", move |max: Dynamic| {
        data::rand_int_min_max(g.lock().rng_mut(), 0, to_int(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandFloatMinMax", move |min: Dynamic, max: Dynamic| {
        data::rand_float_min_max(g.lock().rng_mut(), to_float(&min), to_float(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandFloatMax", move |max: Dynamic| {
        data::rand_float_min_max(g.lock().rng_mut(), 0.0, to_float(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandBool", move || g.lock().rng_mut().gen::<bool>());
    let g = ctx.generator.clone();
    engine.register_fn("RandWord", move |min: Dynamic, max: Dynamic| {
        data::rand_word(g.lock().rng_mut(), to_usize(&min), to_usize(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandSentence", move |min: Dynamic, max: Dynamic| {
        data::rand_sentence(g.lock().rng_mut(), to_usize(&min), to_usize(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandParagraph", move |min: Dynamic, max: Dynamic| {
        data::rand_paragraph(g.lock().rng_mut(), to_usize(&min), to_usize(&max))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandName", move || data::rand_name(g.lock().rng_mut()));
    let g = ctx.generator.clone();
    engine.register_fn("RandEmail", move || data::rand_email(g.lock().rng_mut()));
    let g = ctx.generator.clone();
    engine.register_fn("RandHost", move || data::rand_host(g.lock().rng_mut()));
    let g = ctx.generator.clone();
    engine.register_fn("RandURL", move || data::rand_url(g.lock().rng_mut()));
    let g = ctx.generator.clone();
    engine.register_fn("RandPhone", move || data::rand_phone(g.lock().rng_mut()));
    let g = ctx.generator.clone();
    engine.register_fn("RandString", move |n: Dynamic| {
        data::rand_string(g.lock().rng_mut(), to_usize(&n))
    });
    let g = ctx.generator.clone();
    engine.register_fn("RandRegex", move |pattern: &str| g.lock().rand_regex(pattern));
    let g = ctx.generator.clone();
    engine.register_fn("UUID", move || data::rand_uuid(g.lock().rng_mut()));

    // EnumString picks one space-separated token from all of its arguments
    let g = ctx.generator.clone();
    engine.register_fn("EnumString", move |values: Array| enum_pick(&g, &values));
    let g = ctx.generator.clone();
    engine.register_fn("EnumString", move |a: Dynamic| enum_pick(&g, &[a]));
    let g = ctx.generator.clone();
    engine.register_fn("EnumString", move |a: Dynamic, b: Dynamic| {
        enum_pick(&g, &[a, b])
    });
    let g = ctx.generator.clone();
    engine.register_fn("EnumString", move |a: Dynamic, b: Dynamic, c: Dynamic| {
        enum_pick(&g, &[a, b, c])
    });
    let g = ctx.generator.clone();
    engine.register_fn(
        "EnumString",
        move |a: Dynamic, b: Dynamic, c: Dynamic, d: Dynamic| enum_pick(&g, &[a, b, c, d]),
    );

    let g = ctx.generator.clone();
    engine.register_fn("EnumInt", move |values: Array| {
        parse_or_zero(&enum_pick(&g, &values))
    });
    let g = ctx.generator.clone();
    engine.register_fn("EnumInt", move |a: Dynamic, b: Dynamic| {
        parse_or_zero(&enum_pick(&g, &[a, b]))
    });
    let g = ctx.generator.clone();
    engine.register_fn("EnumInt", move |a: Dynamic, b: Dynamic, c: Dynamic| {
        parse_or_zero(&enum_pick(&g, &[a, b, c]))
    });
}

fn enum_pick(generator: &Mutex<FuzzGenerator>, values: &[Dynamic]) -> String {
    let values: Vec<String> = values.iter().map(to_text).collect();
    data::enum_string(generator.lock().rng_mut(), &values)
}

fn parse_or_zero(s: &str) -> i64 {
    s.trim().parse().unwrap_or(0)
}

fn register_arithmetic(engine: &mut Engine) {
    engine.register_fn("Int", |v: Dynamic| to_int(&v));
    engine.register_fn("Float", |v: Dynamic| to_float(&v));
    engine.register_fn(
        "Add",
        |a: Dynamic, b: Dynamic| -> Result<i64, Box<EvalAltResult>> {
            let (a, b) = (to_int(&a), to_int(&b));
            a.checked_add(b)
                .ok_or_else(|| format!("integer overflow in Add({a}, {b})").into())
        },
    );
    engine.register_fn("LT", |a: Dynamic, b: Dynamic| to_float(&a) < to_float(&b));
    engine.register_fn("LE", |a: Dynamic, b: Dynamic| to_float(&a) <= to_float(&b));
    engine.register_fn("EQ", |a: Dynamic, b: Dynamic| to_float(&a) == to_float(&b));
    engine.register_fn("GT", |a: Dynamic, b: Dynamic| to_float(&a) > to_float(&b));
    engine.register_fn("GE", |a: Dynamic, b: Dynamic| to_float(&a) >= to_float(&b));
    engine.register_fn("Nth", |a: Dynamic, b: Dynamic| {
        to_int(&a).checked_rem(to_int(&b)) == Some(0)
    });
}

fn register_time(engine: &mut Engine) {
    engine.register_fn("Date", || Local::now().format("%Y-%m-%d").to_string());
    engine.register_fn("ISODatetime", || {
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    });
    engine.register_fn("Time", || {
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    });
    engine.register_fn("TimeFormat", |format: &str| {
        let mut out = String::new();
        // invalid strftime specifiers surface as a formatting error
        match write!(out, "{}", Local::now().format(format)) {
            Ok(()) => out,
            Err(_) => format!("invalid time format '{format}'"),
        }
    });
}

fn register_fixtures(engine: &mut Engine, ctx: &FunctionContext) {
    let fixtures = ctx.fixtures.clone();
    let g = ctx.generator.clone();
    engine.register_fn("RandFileLine", move |name: &str| {
        fixtures
            .random_line(name, g.lock().rng_mut())
            .unwrap_or_else(|err| {
                warn!(fixture = name, error = %err, "failed to read fixture line");
                err.to_string()
            })
    });

    let fixtures = ctx.fixtures.clone();
    engine.register_fn("SeededFileLine", move |name: &str, seed: Dynamic| {
        let seed = u64::try_from(to_int(&seed)).unwrap_or(0);
        fixtures.seeded_line(name, seed).unwrap_or_else(|err| {
            warn!(fixture = name, error = %err, "failed to read fixture line");
            err.to_string()
        })
    });

    let fixtures = ctx.fixtures.clone();
    engine.register_fn("FileProperty", move |name: &str, key: &str| {
        match fixtures.property(name, key) {
            Ok(value) => value_to_dynamic(value),
            Err(err) => {
                warn!(fixture = name, error = %err, "failed to read fixture property");
                Dynamic::from(err.to_string())
            }
        }
    });
}

fn request_count(data: &Value) -> i64 {
    data.get(REQUEST_COUNT_KEY)
        .filter(|v| !v.is_null())
        .map_or(-1, |v| v.to_string().trim().parse().unwrap_or(0))
}

fn to_int(value: &Dynamic) -> i64 {
    if let Ok(i) = value.as_int() {
        i
    } else if let Ok(f) = value.as_float() {
        f as i64
    } else {
        to_text(value).trim().parse().unwrap_or(0)
    }
}

fn to_usize(value: &Dynamic) -> usize {
    usize::try_from(to_int(value)).unwrap_or(0)
}

fn to_float(value: &Dynamic) -> f64 {
    if let Ok(f) = value.as_float() {
        f
    } else if let Ok(i) = value.as_int() {
        i as f64
    } else {
        to_text(value).trim().parse().unwrap_or(0.0)
    }
}

/// String form of a script value, matching [`Value`]'s display.
pub(crate) fn to_text(value: &Dynamic) -> String {
    if value.is_unit() {
        return String::new();
    }
    dynamic_to_value(value.clone()).to_string()
}

pub(crate) fn value_to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(b),
        Value::Int(i) => Dynamic::from(i),
        Value::Uint(u) => match i64::try_from(u) {
            Ok(i) => Dynamic::from(i),
            Err(_) => Dynamic::from(u as f64),
        },
        Value::Float(f) => Dynamic::from(f),
        Value::Str(s) => Dynamic::from(s),
        Value::StrMap(m) => {
            let mut map = Map::new();
            for (k, v) in m {
                map.insert(k.into(), Dynamic::from(v));
            }
            Dynamic::from(map)
        }
        Value::Map(m) => {
            let mut map = Map::new();
            for (k, v) in m {
                map.insert(k.into(), value_to_dynamic(v));
            }
            Dynamic::from(map)
        }
        Value::StrSeq(items) => {
            let arr: Array = items.into_iter().map(Dynamic::from).collect();
            Dynamic::from(arr)
        }
        Value::Seq(items) => {
            let arr: Array = items.into_iter().map(value_to_dynamic).collect();
            Dynamic::from(arr)
        }
        Value::Unsupported(kind) => Dynamic::from(format!("<{kind}>")),
    }
}

pub(crate) fn dynamic_to_value(value: Dynamic) -> Value {
    if value.is_unit() {
        Value::Null
    } else if let Ok(b) = value.as_bool() {
        Value::Bool(b)
    } else if let Ok(i) = value.as_int() {
        Value::Int(i)
    } else if let Ok(f) = value.as_float() {
        Value::Float(f)
    } else if let Some(s) = value.clone().try_cast::<String>() {
        Value::Str(s)
    } else if let Some(arr) = value.clone().try_cast::<Array>() {
        Value::Seq(arr.into_iter().map(dynamic_to_value).collect())
    } else if let Some(map) = value.clone().try_cast::<Map>() {
        Value::Map(
            map.into_iter()
                .map(|(k, v)| (k.to_string(), dynamic_to_value(v)))
                .collect(),
        )
    } else {
        Value::Str(format!("{value}"))
    }
}
