//! Solana Vanity Keypair Generator CLI
//!
//! Usage:
//!   sol-vanity -b So              # Find a key starting with "So"
//!   sol-vanity -e end -n 5        # Find 5 keys ending with "end"
//!   sol-vanity -b A -e z -c       # Both ends, case sensitive

use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sol_vanity::{Config, GeneratorOptions, Subsequence, VanityGenerator, VanityResult};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        process::exit(1);
    }

    let mut options = GeneratorOptions::new(&config.key_path);
    options.sig_verify = config.sig_verify;
    options.num_workers = config.worker_count();
    options.find_keys = config.count;
    if let Some(raw) = &config.begins_with {
        if let Err(e) = options.compile_begins_with(raw, config.case_sensitive) {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    }
    if let Some(raw) = &config.ends_with {
        if let Err(e) = options.compile_ends_with(raw, config.case_sensitive) {
            eprintln!("Configuration error: {e}");
            process::exit(1);
        }
    }

    // Print startup info
    println!("Solana Vanity Keypair Generator");
    println!("================================");
    print_pattern("Begins with:", options.begins_with.as_ref());
    print_pattern("Ends with:  ", options.ends_with.as_ref());
    println!(
        "Case:        {}",
        if config.case_sensitive { "sensitive" } else { "insensitive" }
    );
    println!("Workers:     {}", config.worker_count());
    println!("Target:      {} keypair(s)", config.count);
    println!("Key path:    {}", config.key_path.display());
    println!();

    let generator = match VanityGenerator::new(options) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("Failed to start search: {e}");
            process::exit(1);
        }
    };

    // Set up ctrl-c handler
    ctrlc_handler(generator.break_flag_clone());

    println!("Searching... (Press Ctrl+C to stop)\n");

    let mut found = 0u32;
    let report_interval = Duration::from_secs(config.report_interval);

    loop {
        // Wait for a result or time out for a progress report
        match generator.poll(report_interval) {
            Some(result) => {
                found += 1;
                print_result(&result, found);

                if found >= config.count {
                    println!("\nTarget reached! Found {found} keypair(s).");
                    break;
                }
            }
            None => {
                if generator.is_stopped() {
                    println!("\nStopped by user.");
                    break;
                }
                if generator.num_found() >= config.count {
                    break;
                }
                print_progress(&generator);
            }
        }
    }

    // Print final stats
    println!("\n--- Final Statistics ---");
    println!("Keys searched:  {}", format_number(generator.num_searched()));
    println!("Keys found:     {}", generator.num_found());
    println!("Time elapsed:   {:.2}s", generator.elapsed().as_secs_f64());
    println!(
        "Average speed:  {}/s",
        format_number(generator.keys_per_second() as u64)
    );

    generator.join();
}

fn print_pattern(label: &str, pattern: Option<&Subsequence>) {
    if let Some(pattern) = pattern {
        println!(
            "{label} {} [{}]",
            pattern.raw(),
            pattern.difficulty_description()
        );
    }
}

fn print_result(result: &VanityResult, index: u32) {
    println!("=== Match #{index} ===");
    println!("Public key:  {}", result.base58_pubkey);
    println!(
        "Secret key:  {}",
        bs58::encode(result.secret_key).into_string()
    );
    println!("Attempts:    ~{}", result.attempts);
    println!("Elapsed:     {:.2}s", result.elapsed.as_secs_f64());
    println!("Worker:      {}", result.worker_id);
    if result.io_fault {
        println!("WARNING: writing the key file failed twice; copy the secret key now.");
    }
    println!();
}

fn print_progress(generator: &VanityGenerator) {
    println!(
        "[{:>4}s] Searched {} keys ({}/s)",
        generator.elapsed().as_secs(),
        format_number(generator.num_searched()),
        format_number(generator.keys_per_second() as u64)
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(break_flag: std::sync::Arc<std::sync::atomic::AtomicBool>) {
    ctrlc::set_handler(move || {
        break_flag.store(true, std::sync::atomic::Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");
}
