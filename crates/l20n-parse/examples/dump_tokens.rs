use std::io::Read;

use l20n_parse::{Parser, Tokenizer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut source = String::new();
    std::io::stdin().read_to_string(&mut source)?;

    println!("=== Tokens ===");
    for tok in Tokenizer::new(&source) {
        println!("{:?}", tok);
    }

    println!("\n=== Resource ===");
    let mut parser = Parser::new();
    let resource = parser.parse(&source)?;
    for entry in &resource.body {
        println!("{:#?}", entry);
    }

    for junk in resource.junk() {
        eprintln!("{}", junk.error.render("<stdin>", &source));
    }
    Ok(())
}
