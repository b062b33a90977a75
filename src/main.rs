mod context;
mod error;
mod gl;
mod shading_rate_errors;
mod traits;

use std::time::{Duration, Instant};

use clap::Parser;
use context::{ExtensionSupport, TestContext, TestStatus};
use error::CaseError;
use gl::{AttachmentLimits, DriverConfig, Fault, GlFunctions, ReferenceDriver};
use indicatif::{ProgressBar, ProgressStyle};
use shading_rate_errors::FragmentShadingRateErrors;
use traits::{run_case, ConformanceCase};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "GL_EXT_fragment_shading_rate negative API conformance check",
    long_about = None
)]
struct Args {
    /// Hide GL_EXT_fragment_shading_rate from the driver
    #[arg(long, default_value_t = false)]
    no_fsr: bool,

    /// Hide GL_EXT_fragment_shading_rate_attachment from the driver
    #[arg(long, default_value_t = false)]
    no_attachment: bool,

    /// Hide GL_EXT_fragment_shading_rate_primitive from the driver
    #[arg(long, default_value_t = false)]
    no_primitive: bool,

    /// Report non-trivial combiners as unsupported
    #[arg(long, default_value_t = false)]
    trivial_combiners_only: bool,

    /// MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_LAYERS_EXT
    #[arg(long, default_value_t = AttachmentLimits::default().max_layers)]
    max_layers: i32,

    /// MAX_FRAGMENT_SHADING_RATE_ATTACHMENT_TEXEL_ASPECT_RATIO_EXT
    #[arg(long, default_value_t = AttachmentLimits::default().max_aspect_ratio)]
    max_aspect_ratio: i32,

    /// Minimum attachment texel width and height
    #[arg(long, default_value_t = AttachmentLimits::default().min_texel_width)]
    min_texel: i32,

    /// Maximum attachment texel width and height
    #[arg(long, default_value_t = AttachmentLimits::default().max_texel_width)]
    max_texel: i32,

    /// Make the driver break a validation rule (repeatable)
    #[arg(long = "inject", value_enum)]
    faults: Vec<Fault>,

    /// Extension string to derive capability flags from, instead of asking the driver
    #[arg(long)]
    extensions: Option<String>,

    /// List injectable faults and exit
    #[arg(long, default_value_t = false)]
    list_faults: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            extensions: ExtensionSupport {
                fragment_shading_rate: !self.no_fsr,
                attachment: !self.no_attachment,
                primitive: !self.no_primitive,
            },
            limits: AttachmentLimits {
                min_texel_width: self.min_texel,
                max_texel_width: self.max_texel,
                min_texel_height: self.min_texel,
                max_texel_height: self.max_texel,
                max_aspect_ratio: self.max_aspect_ratio,
                max_layers: self.max_layers,
            },
            non_trivial_combiners: !self.trivial_combiners_only,
            faults: self.faults.clone(),
        }
    }
}

/// Outcome of one run, ready for printing.
struct RunReport {
    status: TestStatus,
    ctx: TestContext,
    gl_calls: usize,
    elapsed: Duration,
}

/// Builds the driver described by `args` and runs the case against it.
fn run_conformance(args: &Args, progress: &ProgressBar) -> Result<RunReport, CaseError> {
    let mut driver = ReferenceDriver::new(args.driver_config())?;

    let extensions = match &args.extensions {
        Some(list) => ExtensionSupport::from_extension_string(list),
        None => ExtensionSupport::from_names(&driver.get_extensions()),
    };
    log::info!("Capabilities: {:?}", extensions);

    let mut case = FragmentShadingRateErrors::new();
    let mut ctx = TestContext::new(extensions);
    progress.set_message(case.name());

    let start = Instant::now();
    let status = run_case(&mut case, &mut ctx, &mut driver);
    Ok(RunReport {
        status,
        ctx,
        gl_calls: driver.calls().len(),
        elapsed: start.elapsed(),
    })
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "info" } else { "warn" }),
    )
    .init();

    if args.list_faults {
        println!("Injectable faults:");
        for fault in Fault::all_faults() {
            println!("  {:<28} {}", fault.name(), fault.description());
        }
        std::process::exit(0);
    }

    println!("Fragment Shading Rate Error Conformance");
    println!("=======================================");
    let config = args.driver_config();
    println!("Driver: reference ({})", config.extensions.names().join(" "));
    if !config.faults.is_empty() {
        let names: Vec<&str> = config.faults.iter().map(|f| f.name()).collect();
        println!("Injected faults: {}", names.join(", "));
    }
    println!();

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    let report = match run_conformance(&args, &pb) {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            eprintln!("Error setting up run: {}", e);
            std::process::exit(TestStatus::InternalError.exit_code());
        }
    };
    pb.finish_and_clear();

    for record in report.ctx.checks() {
        if args.verbose || !record.passed() {
            println!("{}", record);
        }
    }
    for message in report.ctx.messages() {
        if args.verbose {
            println!("log: {}", message);
        }
    }

    let failed = report.ctx.failed_checks().count();
    let description = report.ctx.result().map(|(_, d)| d.to_string()).unwrap_or_default();

    println!();
    println!("Test Complete");
    println!("=============");
    println!("Checks run: {}", report.ctx.checks().len());
    println!("Checks failed: {}", failed);
    println!("GL calls: {}", report.gl_calls);
    println!("Duration: {}", humantime::format_duration(report.elapsed));
    println!("Result: {} ({})", report.status, description);

    std::process::exit(report.status.exit_code());
}
