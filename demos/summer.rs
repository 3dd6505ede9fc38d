use pinion::{Collection, CommandLineParser, Parameter};

fn main() {
    let mut items: Vec<u32> = Vec::default();

    let clp = CommandLineParser::new("summer");
    let parser = clp
        .about("Add up a list of numbers.")
        .add(
            Parameter::argument(Collection::new(&mut items), "item")
                .required()
                .help("The items to sum."),
        )
        .build();

    parser.parse();
    let sum: u32 = items.iter().sum();
    println!("Sum: {sum}");
}
