use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use tally::{JobId, JobRecord, Map};

/// Datetime format used by `sacct` and `scontrol` (local time).
const SLURM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Columns requested from `sacct`, in this order.
pub const SACCT_FORMAT: &str = "JobID,Account,Partition,CPUTimeRAW,End";

pub fn parse_slurm_datetime(datetime: &str) -> anyhow::Result<NaiveDateTime> {
    Ok(NaiveDateTime::parse_from_str(
        datetime,
        SLURM_DATETIME_FORMAT,
    )?)
}

/// Formats a timestamp in local time, as expected by `sacct --starttime/--endtime`.
pub fn format_slurm_datetime(datetime: &DateTime<Utc>) -> String {
    datetime
        .with_timezone(&Local)
        .format(SLURM_DATETIME_FORMAT)
        .to_string()
}

fn local_to_utc(datetime: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&datetime)
        .earliest()
        .map(|datetime| datetime.with_timezone(&Utc))
}

/// Parse <key>=<value> pairs from the output of `scontrol show <entity>`.
pub fn get_scontrol_items(output: &str) -> Map<&str, &str> {
    let mut map = Map::default();
    for line in output.lines() {
        for item in line.split_whitespace() {
            if let Some((key, value)) = item.split_once('=') {
                map.insert(key, value);
            }
        }
    }
    map
}

/// Partition names from the output of `scontrol show partition --oneliner`.
pub fn parse_partition_names(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            get_scontrol_items(line)
                .get("PartitionName")
                .map(|name| name.to_string())
        })
        .collect()
}

/// Parses one line of `sacct --parsable2 --format=<SACCT_FORMAT>`.
///
/// Returns `Ok(None)` for jobs that have not ended yet.
pub fn parse_sacct_line(line: &str) -> anyhow::Result<Option<JobRecord>> {
    let columns: Vec<&str> = line.split('|').collect();
    let [job_id, account, partition, cpu_seconds, end] = columns[..] else {
        anyhow::bail!("Expected 5 columns, found {}", columns.len());
    };

    if matches!(end, "Unknown" | "None" | "") {
        return Ok(None);
    }
    let end_time = parse_slurm_datetime(end)
        .map_err(|err| anyhow::anyhow!("Cannot parse Slurm datetime {end}: {err:?}"))?;
    let end_time = local_to_utc(end_time)
        .ok_or_else(|| anyhow::anyhow!("Invalid local time {end}"))?;

    Ok(Some(JobRecord {
        job_id: parse_job_id(job_id)?,
        account: account.to_string(),
        // A job eligible for several partitions lists all of them, it ran in the first one
        partition: partition.split(',').next().unwrap_or_default().to_string(),
        cpu_seconds: cpu_seconds
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid CPUTimeRAW value {cpu_seconds}"))?,
        end_time,
    }))
}

/// Array and heterogeneous jobs have IDs like `1234_7` or `1234+1`, only the leading number is used.
fn parse_job_id(value: &str) -> anyhow::Result<JobId> {
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map(|end| &value[..end])
        .unwrap_or(value);
    digits
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid job id {value}"))
}

/// Parses the whole `sacct` output. Lines that cannot be parsed are logged and skipped.
pub fn parse_sacct_output(output: &str) -> Vec<JobRecord> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse_sacct_line(line) {
            Ok(record) => record,
            Err(error) => {
                log::warn!("Skipping sacct line `{line}`: {error}");
                None
            }
        })
        .collect()
}
