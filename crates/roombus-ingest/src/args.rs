//! Ingest child-process argument grammar (§4.5, §6) for SRT/RIST sources.
//!
//! Symmetric to `roombus_egress::args`: pure functions building the `ffmpeg`
//! argument vector that demuxes the source protocol and re-encodes to
//! Opus/48k/stereo RTP aimed at the SFU's `comedia=true` producer-side plain
//! transport. WHIP doesn't go through here — it's already WebRTC and is
//! handled by `whip.rs` directly against the orchestrator.

use roombus_common::models::audio_source::SourceTransportMode;

fn srt_input_url(
    mode: SourceTransportMode,
    host: Option<&str>,
    port: Option<u16>,
    stream_id: Option<&str>,
    passphrase: Option<&str>,
    latency_ms: Option<u32>,
) -> Result<String, String> {
    let mut query = Vec::new();
    let base = match mode {
        SourceTransportMode::Listener => {
            let port = port.ok_or("listener SRT source requires an allocated port")?;
            query.push("mode=listener".to_string());
            format!("srt://:{port}")
        }
        SourceTransportMode::Caller => {
            let host = host.ok_or("caller SRT source requires a host")?;
            let port = port.ok_or("caller SRT source requires a port")?;
            query.push("mode=caller".to_string());
            format!("srt://{host}:{port}")
        }
    };
    if let Some(id) = stream_id {
        query.push(format!("streamid={id}"));
    }
    if let Some(pass) = passphrase {
        query.push(format!("passphrase={pass}"));
    }
    if let Some(latency) = latency_ms {
        query.push(format!("latency={latency}"));
    }
    Ok(format!("{base}?{}", query.join("&")))
}

fn rist_input_url(mode: SourceTransportMode, host: Option<&str>, port: Option<u16>) -> Result<String, String> {
    match mode {
        SourceTransportMode::Listener => {
            let port = port.ok_or("listener RIST source requires an allocated port")?;
            Ok(format!("rist://@:{port}"))
        }
        SourceTransportMode::Caller => {
            let host = host.ok_or("caller RIST source requires a host")?;
            let port = port.ok_or("caller RIST source requires a port")?;
            Ok(format!("rist://{host}:{port}"))
        }
    }
}

/// Builds the `ffmpeg` argument vector reading `input_url` and pushing
/// Opus/48k/stereo RTP, payload type 111, at `127.0.0.1:<rtp_port>`.
fn rtp_output_args(input_url: String, rtp_port: u16) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "warning".into(),
        "-i".into(),
        input_url,
        "-c:a".into(),
        "libopus".into(),
        "-ar".into(),
        "48000".into(),
        "-ac".into(),
        "2".into(),
        "-payload_type".into(),
        "111".into(),
        "-f".into(),
        "rtp".into(),
        format!("rtp://127.0.0.1:{rtp_port}"),
    ]
}

pub fn srt_args(
    mode: SourceTransportMode,
    host: Option<&str>,
    port: Option<u16>,
    stream_id: Option<&str>,
    passphrase: Option<&str>,
    latency_ms: Option<u32>,
    rtp_port: u16,
) -> Result<Vec<String>, String> {
    let input = srt_input_url(mode, host, port, stream_id, passphrase, latency_ms)?;
    Ok(rtp_output_args(input, rtp_port))
}

pub fn rist_args(
    mode: SourceTransportMode,
    host: Option<&str>,
    port: Option<u16>,
    rtp_port: u16,
) -> Result<Vec<String>, String> {
    let input = rist_input_url(mode, host, port)?;
    Ok(rtp_output_args(input, rtp_port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srt_listener_url_has_no_host() {
        let url = srt_input_url(SourceTransportMode::Listener, None, Some(9000), None, None, Some(120)).unwrap();
        assert_eq!(url, "srt://:9000?mode=listener&latency=120");
    }

    #[test]
    fn srt_caller_requires_host() {
        let err = srt_input_url(SourceTransportMode::Caller, None, Some(9000), None, None, None).unwrap_err();
        assert!(err.contains("host"));
    }

    #[test]
    fn rist_caller_url() {
        let url = rist_input_url(SourceTransportMode::Caller, Some("1.2.3.4"), Some(5000)).unwrap();
        assert_eq!(url, "rist://1.2.3.4:5000");
    }

    #[test]
    fn rtp_output_targets_loopback_with_opus_payload_111() {
        let args = rtp_output_args("srt://:9000?mode=listener".into(), 6000);
        assert!(args.contains(&"111".to_string()));
        assert_eq!(args.last().unwrap(), "rtp://127.0.0.1:6000");
    }
}
