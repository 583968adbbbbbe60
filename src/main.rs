use std::process;

use clap::Parser;

use lendcheck::borrowck::BorrowChecker;
use lendcheck::cfg::Cfg;
use lendcheck::cli::CliArgs;
use lendcheck::demo::{self, DEMO_LISTING};
use lendcheck::facts::AnalysisFacts;
use lendcheck::profiler;

fn main() {
    set_panic_handler();

    let args = CliArgs::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    let code = profiler::profile("top", || run(&args));

    if args.profile {
        profiler::profile_log();
    }

    process::exit(code);
}

fn run(args: &CliArgs) -> i32 {
    let program = profiler::profile("build-program", demo::demo_program);

    if let Some(locator) = &args.analyse {
        let Some(id) = program.find(&locator.name, locator.index) else {
            eprintln!("{} yielded no match", locator);
            return 1;
        };
        let func = program.function(id);

        if args.verbose {
            println!("{}", func);
        }

        let cfg = Cfg::build(func);
        if args.dot {
            cfg.write_dot(std::io::stdout().lock()).expect("stdout died");
        }

        let facts = AnalysisFacts::extract(&cfg);
        let errors = BorrowChecker::check(&facts);
        for error in &errors {
            print!("{}", error.to_diagnostic(func, &facts).render(DEMO_LISTING));
        }

        return error_code(args, errors.len());
    }

    let report = profiler::profile("run-demo", demo::run_demo);

    println!("drained {:?} out of the list", report.drained);
    for msg in &report.sum_messages {
        println!("{}", msg);
    }
    println!("clamped sum of 0..10 = {}", report.sum.value());
    println!();

    for rendered in &report.rendered {
        print!("{}", rendered);
    }
    if report.errors.is_empty() {
        println!("checked the demo program: no errors");
    }

    error_code(args, report.errors.len())
}

fn error_code(args: &CliArgs, errors: usize) -> i32 {
    if args.deny && errors > 0 {
        1
    } else {
        0
    }
}

/// When any thread panics, close the process.
fn set_panic_handler() {
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(1);
    }));
}
