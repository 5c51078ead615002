use log::{debug, info};
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::process;
use zcore::{Config, ConsoleOutput, Interpreter, StdinInput};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    // Exactly one story path; anything else just prints usage
    if args.len() != 2 {
        let program = args.first().map_or("zcore", String::as_str);
        println!("zcore - Z-machine interpreter for version 1-3 story files");
        println!();
        println!("Usage: {} <story_file>", program);
        println!();
        println!("Set RUST_LOG=debug for call tracing, and ZCORE_CONFIG to a TOML file");
        println!("for max_instructions, random_seed and trace_instructions.");
        return;
    }

    let story_path = &args[1];
    debug!("loading story file: {}", story_path);

    let mut story = Vec::new();
    let read = File::open(story_path).and_then(|mut file| file.read_to_end(&mut story));
    if let Err(e) = read {
        eprintln!("Error: cannot read story file '{}': {}", story_path, e);
        process::exit(1);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let interpreter = match Interpreter::new(story, config, Box::new(ConsoleOutput)) {
        Ok(interpreter) => interpreter,
        Err(e) => {
            eprintln!("Error: cannot load '{}': {}", story_path, e);
            process::exit(1);
        }
    };
    let mut interpreter = interpreter.with_input(Box::new(StdinInput));

    info!(
        "version {} story, initial PC {:04x}",
        interpreter.header.version, interpreter.header.initial_pc
    );

    if let Err(fault) = interpreter.run() {
        eprintln!("\nError during execution: {}", fault);
        process::exit(1);
    }
    debug!("story ended after {} instructions", interpreter.instruction_count());
}
