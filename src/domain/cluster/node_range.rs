use crate::domain::cluster::topology::ClusterTopology;
use crate::error::{Error, Result};

/// Splits a top level comma separated list, ignoring commas inside `[...]`.
fn split_top_level(input: &str) -> Result<Vec<&str>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut item_start = 0usize;

    for (pos, ch) in input.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return Err(Error::InvalidRequest(format!("unbalanced brackets in node list {}", input)));
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                items.push(input[item_start..pos].trim());
                item_start = pos + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(Error::InvalidRequest(format!("unbalanced brackets in node list {}", input)));
    }

    items.push(input[item_start..].trim());

    Ok(items.into_iter().filter(|item| !item.is_empty()).collect())
}

fn parse_number(part: &str, input: &str) -> Result<usize> {
    part.trim().parse::<usize>().map_err(|_| Error::InvalidRequest(format!("invalid number {:?} in node list {}", part, input)))
}

/// Expands a node list such as `kn[1-3,7],kn10` into host names.
///
/// Every name is normalized to the padded form of the topology. Order of appearance is kept.
pub fn split_range(topology: &ClusterTopology, input: &str) -> Result<Vec<String>> {
    let mut hosts = Vec::new();

    for item in split_top_level(input)? {
        let Some(open) = item.find('[') else {
            let index = topology.node_index(item)?;
            hosts.push(topology.node_name(index));
            continue;
        };

        let prefix = &item[..open];
        if prefix != topology.prefix() || !item.ends_with(']') {
            return Err(Error::InvalidRequest(format!("invalid node range {}", item)));
        }

        for part in item[open + 1..item.len() - 1].split(',') {
            match part.split_once('-') {
                Some((low, high)) => {
                    let low = parse_number(low, input)?;
                    let high = parse_number(high, input)?;

                    if low > high {
                        return Err(Error::InvalidRequest(format!("descending range {}-{} in node list {}", low, high, input)));
                    }

                    for number in low..=high {
                        topology.number_to_index(number)?;
                        hosts.push(topology.format_number(number));
                    }
                }
                None => {
                    let number = parse_number(part, input)?;
                    topology.number_to_index(number)?;
                    hosts.push(topology.format_number(number));
                }
            }
        }
    }

    if hosts.is_empty() {
        return Err(Error::InvalidRequest(format!("node list {:?} names no hosts", input)));
    }

    Ok(hosts)
}

/// Compacts host names into the bracket form accepted by [`split_range`]:
/// `["kn1", "kn2", "kn3", "kn7"]` becomes `kn[1-3,7]`.
pub fn unsplit_range(topology: &ClusterTopology, hosts: &[String]) -> Result<String> {
    let mut numbers: Vec<usize> = topology.node_indices(hosts)?.into_iter().map(|index| index + topology.start()).collect();
    numbers.sort_unstable();
    numbers.dedup();

    match numbers.as_slice() {
        [] => return Ok(String::new()),
        [single] => return Ok(topology.format_number(*single)),
        _ => {}
    }

    let pad = topology.pad_len();
    let mut runs: Vec<String> = Vec::new();
    let mut run_start = numbers[0];
    let mut previous = numbers[0];

    for &number in &numbers[1..] {
        if number == previous + 1 {
            previous = number;
            continue;
        }

        runs.push(format_run(run_start, previous, pad));
        run_start = number;
        previous = number;
    }
    runs.push(format_run(run_start, previous, pad));

    Ok(format!("{}[{}]", topology.prefix(), runs.join(",")))
}

fn format_run(low: usize, high: usize, pad: usize) -> String {
    if low == high {
        format!("{:0pad$}", low, pad = pad)
    } else {
        format!("{:0pad$}-{:0pad$}", low, high, pad = pad)
    }
}
