use std::fs::File;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use varpack::{
    Endpoint, FileHeader, Producer, ReaderOptions, Schema, Variable, WriterOptions, load_vars,
    peek_header, save_vars,
};

use crate::cli::{DemoArgs, InspectArgs};

/// Producer name written into demo files.
pub const DEMO_PRODUCER: &str = "varpack-demo";
/// Capacity of the demo integer buffer.
pub const MAX_INTS: usize = 4096;

/// Producer identity of the demo, version 1.0.
pub fn demo_producer() -> Producer {
    Producer::named(DEMO_PRODUCER)
        .with_version(1, 0)
        .with_description("varpack demo")
}

/// Values held by the demo after loading and before saving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoValues {
    pub flag: bool,
    pub ints: Vec<i32>,
    pub text: Option<String>,
}

/// Start from the command-line values, overlay whatever `input` holds, and
/// save the result to `output`.
pub fn run_demo(args: &DemoArgs) -> Result<DemoValues> {
    if args.ints.len() > MAX_INTS {
        bail!(
            "at most {MAX_INTS} integers can be stored, got {}",
            args.ints.len()
        );
    }

    let mut flag = args.flag;
    let mut ints = vec![0i32; MAX_INTS];
    ints[..args.ints.len()].copy_from_slice(&args.ints);
    let mut len = args.ints.len();
    let mut text = args.text.clone();

    if let Some(input) = &args.input {
        let mut schema = Schema::new()
            .with(Variable::scalar("flag", &mut flag))
            .with(Variable::fixed("ints", &mut ints, &mut len).with_bounds(0, MAX_INTS))
            .with(Variable::owned("text", &mut text));
        let loaded = load_vars(
            Endpoint::path(input),
            ReaderOptions::new(),
            demo_producer(),
            &mut schema,
        );
        let header = match loaded {
            Ok(header) => header,
            Err(err) => {
                if let Some(echo) = &err.echo {
                    warn!(
                        path = %input.display(),
                        magic = echo.magic(),
                        producer = ?echo.header().and_then(|header| header.producer.as_ref()),
                        "rejected file header"
                    );
                }
                return Err(err).with_context(|| format!("failed to load {}", input.display()));
            }
        };
        info!(
            path = %input.display(),
            endian = %header.endian,
            word_width = header.metadata.word_width,
            "loaded demo variables"
        );
    }

    if let Some(output) = &args.output {
        let mut schema = Schema::new()
            .with(Variable::scalar("flag", &mut flag).with_description("demo flag"))
            .with(
                Variable::fixed("ints", &mut ints, &mut len)
                    .with_bounds(0, MAX_INTS)
                    .with_description("demo integers"),
            );
        if let Some(text) = text.as_mut() {
            schema.push(Variable::scalar("text", text).with_description("demo text"));
        }
        save_vars(
            Endpoint::path(output),
            WriterOptions::new(),
            demo_producer(),
            &schema,
        )
        .with_context(|| format!("failed to save {}", output.display()))?;
        info!(path = %output.display(), variables = schema.len(), "saved demo variables");
    }

    Ok(DemoValues {
        flag,
        ints: ints[..len].to_vec(),
        text,
    })
}

/// Decode the header of `args.file` without checking producer or format.
pub fn run_inspect(args: &InspectArgs) -> Result<FileHeader> {
    let file = File::open(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    peek_header(file).with_context(|| format!("failed to read header of {}", args.file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_without_files_echoes_arguments() {
        let args = DemoArgs {
            flag: true,
            ints: vec![3, -1],
            ..DemoArgs::default()
        };
        let values = run_demo(&args).unwrap();
        assert_eq!(
            values,
            DemoValues {
                flag: true,
                ints: vec![3, -1],
                text: None,
            }
        );
    }

    #[test]
    fn test_demo_rejects_too_many_ints() {
        let args = DemoArgs {
            ints: vec![0; MAX_INTS + 1],
            ..DemoArgs::default()
        };
        let err = run_demo(&args).unwrap_err();
        assert!(err.to_string().contains("at most 4096"));
    }
}
