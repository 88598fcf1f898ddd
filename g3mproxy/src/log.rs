/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io::{self, Write};

use chrono::Local;
use slog::{Drain, KV, Key, OwnedKVList, Record, Serializer};
use slog_scope::GlobalLoggerGuard;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A synchronous slog drain that writes plain text lines to stderr.
pub struct StdioDrain {
    append_code_position: bool,
}

impl StdioDrain {
    pub fn new(append_code_position: bool) -> Self {
        StdioDrain {
            append_code_position,
        }
    }
}

impl Drain for StdioDrain {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        let mut buf = Vec::with_capacity(256);
        write_plain(&mut buf, record, values, self.append_code_position)?;
        let mut stderr = io::stderr().lock();
        stderr.write_all(&buf)?;
        stderr.flush()
    }
}

#[derive(Default)]
struct KvCollector {
    pairs: Vec<(String, String)>,
}

impl Serializer for KvCollector {
    fn emit_arguments(&mut self, key: Key, val: &fmt::Arguments) -> slog::Result {
        self.pairs.push((key.to_string(), val.to_string()));
        Ok(())
    }
}

fn write_plain<W: Write>(
    io: &mut W,
    record: &Record,
    values: &OwnedKVList,
    append_code_position: bool,
) -> io::Result<()> {
    let mut kv = KvCollector::default();
    let _ = record.kv().serialize(record, &mut kv);
    let _ = values.serialize(record, &mut kv);

    write!(io, "{}", Local::now().format(TIME_FORMAT))?;
    write!(io, " {}", record.level())?;
    for (k, v) in &kv.pairs {
        write!(io, " {k}: {v},")?;
    }
    let msg = record.msg().to_string();
    if msg.is_empty() {
        write!(io, " ()")?;
    } else {
        write!(io, " {msg}")?;
    }
    if append_code_position {
        write!(io, " <{}:{}>", record.module(), record.line())?;
    }
    writeln!(io)
}

/// Install the process logger and bridge the `log` facade into it.
///
/// The verbose level maps 0 to warn, 1 to info, 2 to debug and more to trace.
pub fn setup(verbose_level: u8) -> anyhow::Result<GlobalLoggerGuard> {
    let drain = StdioDrain::new(true).ignore_res();
    let logger = slog::Logger::root(drain, slog::o!());
    let scope_guard = slog_scope::set_global_logger(logger);

    let log_level = match verbose_level {
        0 => log::Level::Warn,
        1 => log::Level::Info,
        2 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    slog_stdlog::init_with_level(log_level)
        .map_err(|e| anyhow::anyhow!("failed to set up logger: {e}"))?;
    Ok(scope_guard)
}
