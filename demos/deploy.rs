use pinion::prelude::*;
use pinion::{
    ActionError, Choice, Collection, CommandLineParser, Counter, Duration, MapResolver, Optional,
    Parameter, ParseContext, PrefixedEnvarResolver, Scalar, Switch,
};

fn known_hosts() -> Vec<String> {
    vec!["web-1".to_string(), "web-2".to_string(), "worker-1".to_string()]
}

fn main() {
    let mut verbosity: usize = 0;
    let mut dry_run: bool = false;
    let mut region: String = String::default();
    let mut timeout: Duration = Duration::default();
    let mut strategy: String = String::default();
    let mut service: String = String::default();
    let mut tag: Option<String> = None;
    let mut hosts: Vec<String> = Vec::default();

    let parser = CommandLineParser::new("deploy")
        .about("Roll services out to a fleet of hosts.")
        .version("deploy 0.3.0")
        .envar_prefix("DEPLOY")
        .resolver(PrefixedEnvarResolver::new("DEPLOY_DEFAULTS", "_"))
        .resolver(MapResolver::new().with("region", ["us-east-1"]))
        .add(
            Parameter::flag(Counter::new(&mut verbosity), "verbose", Some('v'))
                .help("Increase the logging verbosity (repeatable)."),
        )
        .add(
            Parameter::flag(Switch::new(&mut dry_run), "dry-run", Some('n'))
                .help("Print the plan without applying it.")
                .envar("DRY_RUN"),
        )
        .add(
            Parameter::flag(Scalar::new(&mut region), "region", Some('r'))
                .help("The region to deploy into.")
                .choice("us-east-1".to_string(), "North Virginia.")
                .choice("eu-west-1".to_string(), "Ireland."),
        )
        .add(
            Parameter::flag(Scalar::new(&mut timeout), "timeout", Some('t'))
                .help("How long to wait for the fleet to settle.")
                .placeholder("DURATION")
                .default(Duration::from_secs(300)),
        )
        .command("rollout", |rollout| {
            rollout
                .about("Roll a service out.")
                .alias("ro")
                .add(
                    Parameter::flag(
                        Choice::new(&mut strategy, ["canary", "blue-green", "rolling"]),
                        "strategy",
                        Some('s'),
                    )
                    .help("How to replace the running instances.")
                    .default("rolling".to_string()),
                )
                .add(
                    Parameter::argument(Scalar::new(&mut service), "service")
                        .required()
                        .help("The service to roll out."),
                )
                .add(
                    Parameter::argument(Optional::new(&mut tag), "tag")
                        .help("The image tag; the latest build when absent."),
                )
        })
        .command("hosts", |hosts_command| {
            hosts_command
                .about("Inspect and maintain the fleet.")
                .command("list", |list| list.default().about("List the hosts."))
                .command("drain", |drain| {
                    drain
                        .about("Take hosts out of rotation.")
                        .add(
                            Parameter::argument(Collection::new(&mut hosts), "host")
                                .required()
                                .hint_action(known_hosts),
                        )
                        .validate(|context: &ParseContext| -> Result<(), ActionError> {
                            if context.values_of("host").len() > 2 {
                                return Err("refusing to drain more than 2 hosts at once".into());
                            }

                            Ok(())
                        })
                })
        })
        .build();

    let context = parser.parse();

    println!("command: {}", context.selected_command());
    println!("verbosity: {verbosity}");
    println!("dry-run: {dry_run}");

    match context.source_of("region") {
        Some(source) => println!("region: {region} (from {source})"),
        None => println!("region: {region}"),
    }

    println!("timeout: {timeout}");

    match context.selected_path() {
        [command] if command == "rollout" => {
            let tag = tag.unwrap_or_else(|| "latest".to_string());
            println!("rolling out {service}:{tag} ({strategy})");
        }
        [_, command] if command == "drain" => println!("draining {}", hosts.join(", ")),
        _ => println!("hosts: {}", known_hosts().join(", ")),
    }
}
