//! HTTP-level tests for the receiver control client

mod helpers;

use helpers::{fixture, mock_control, put_ok, CONTROL_PATH};
use mockito::{Matcher, Server};
use rstest::rstest;
use yamaha_client::{ClientError, ReceiverControl, YamahaClient, Zone, VOLUME_UNAVAILABLE};

#[tokio::test]
async fn test_system_config_from_receiver() {
    let mut server = Server::new_async().await;
    let mock = mock_control(
        &mut server,
        r#"cmd="GET"><System><Config>GetParam"#,
        fixture("system_config_rx_v671.xml"),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let config = client.get_system_config().await.unwrap();

    assert_eq!(config.model_name.as_deref(), Some("RX-V671"));
    assert_eq!(config.system_id.as_deref(), Some("0A8B0F23"));
    assert!(config.has_feature("AirPlay"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_available_zones_from_feature_existence() {
    let mut server = Server::new_async().await;
    mock_control(
        &mut server,
        "<System><Config>GetParam",
        fixture("system_config_rx_v671.xml"),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let zones = client.get_available_zones().await.unwrap();

    assert_eq!(zones, vec![Zone::Main, Zone::Zone2]);
}

#[rstest]
#[case(None, "basic_status_main_zone.xml", "<Main_Zone><Basic_Status>GetParam", true, -455, false)]
#[case(Some(Zone::Zone2), "basic_status_zone_2.xml", "<Zone_2><Basic_Status>GetParam", false, -400, true)]
#[tokio::test]
async fn test_basic_info_per_zone(
    #[case] zone: Option<Zone>,
    #[case] fixture_file: &str,
    #[case] pattern: &str,
    #[case] expected_on: bool,
    #[case] expected_volume: i32,
    #[case] expected_muted: bool,
) {
    let mut server = Server::new_async().await;
    mock_control(&mut server, pattern, fixture(fixture_file)).await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let info = client.get_basic_info(zone).await.unwrap();

    assert_eq!(info.is_on(), expected_on);
    assert_eq!(info.volume, expected_volume);
    assert_ne!(info.volume, VOLUME_UNAVAILABLE);
    assert_eq!(info.muted, expected_muted);
    assert_eq!(client.is_on(zone).await.unwrap(), expected_on);
}

#[tokio::test]
async fn test_current_input_reads_main_zone() {
    let mut server = Server::new_async().await;
    mock_control(
        &mut server,
        "<Main_Zone><Basic_Status>GetParam",
        fixture("basic_status_main_zone.xml"),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    assert_eq!(
        client.get_current_input().await.unwrap().as_deref(),
        Some("HDMI2")
    );
}

#[tokio::test]
async fn test_set_volume_sends_tenths_of_db() {
    let mut server = Server::new_async().await;
    let mock = mock_control(
        &mut server,
        r#"cmd="PUT"><Zone_2><Volume><Lvl><Val>-300</Val><Exp>1</Exp><Unit>dB</Unit>"#,
        put_ok(),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    client.set_volume_to(-300, Some(Zone::Zone2)).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_input_name_with_markup_is_escaped() {
    let mut server = Server::new_async().await;
    let mock = mock_control(
        &mut server,
        "<Main_Zone><Input><Input_Sel>R&amp;B &lt;Lounge&gt;</Input_Sel></Input></Main_Zone>",
        put_ok(),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    client.set_main_input_to("R&B <Lounge>").await.unwrap();

    mock.assert_async().await;
}

#[rstest]
#[case(Some(Zone::System), true, "<System><Power_Control><Power>On</Power>")]
#[case(None, false, "<Main_Zone><Power_Control><Power>Standby</Power>")]
#[case(Some(Zone::Zone3), true, "<Zone_3><Power_Control><Power>On</Power>")]
#[tokio::test]
async fn test_power_documents(
    #[case] zone: Option<Zone>,
    #[case] on: bool,
    #[case] pattern: &str,
) {
    let mut server = Server::new_async().await;
    let mock = mock_control(&mut server, pattern, put_ok()).await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    if on {
        client.power_on(zone).await.unwrap();
    } else {
        client.power_off(zone).await.unwrap();
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_tuner_presets_and_info() {
    let mut server = Server::new_async().await;
    mock_control(
        &mut server,
        "<Preset><Data>GetParam",
        fixture("tuner_preset_data.xml"),
    )
    .await;
    mock_control(
        &mut server,
        "<Tuner><Play_Info>GetParam",
        fixture("tuner_play_info.xml"),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let presets = client.get_tuner_preset_list().await.unwrap();
    let info = client.get_tuner_info().await.unwrap();

    assert_eq!(presets.len(), 3);
    assert_eq!(presets[1].value, "99.90");
    assert!(info.is_playing_preset(2));
}

#[tokio::test]
async fn test_party_mode_round_trip() {
    let mut server = Server::new_async().await;
    let on = mock_control(&mut server, "<Party_Mode><Mode>On</Mode>", put_ok()).await;
    mock_control(
        &mut server,
        "<Party_Mode><Mode>GetParam",
        r#"<YAMAHA_AV rsp="GET" RC="0"><System><Party_Mode><Mode>On</Mode></Party_Mode></System></YAMAHA_AV>"#
            .to_string(),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    client.party_mode_on().await.unwrap();

    assert!(client.is_party_mode_enabled().await.unwrap());
    on.assert_async().await;
}

#[tokio::test]
async fn test_raw_command_is_sent_verbatim() {
    let payload = yamaha_client::commands::scene(2);
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", CONTROL_PATH)
        .match_body(Matcher::Exact(payload.clone()))
        .with_body(put_ok())
        .create_async()
        .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    client.send_raw_command(&payload).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_nonzero_response_code_is_device_error() {
    let mut server = Server::new_async().await;
    mock_control(
        &mut server,
        "<Input_Sel>",
        r#"<YAMAHA_AV rsp="PUT" RC="3"></YAMAHA_AV>"#.to_string(),
    )
    .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let result = client.set_main_input_to("NOPE").await;

    assert_eq!(result, Err(ClientError::Device { code: 3 }));
}

#[tokio::test]
async fn test_http_failure_is_network_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", CONTROL_PATH)
        .with_status(500)
        .create_async()
        .await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let result = client.get_system_config().await;

    assert!(matches!(result, Err(ClientError::Network(_))));
}

#[tokio::test]
async fn test_garbage_body_is_parse_error() {
    let mut server = Server::new_async().await;
    mock_control(&mut server, "GetParam", "not xml at all".to_string()).await;

    let client = YamahaClient::new(server.host_with_port()).unwrap();
    let result = client.get_tuner_info().await;

    assert!(matches!(result, Err(ClientError::Parse(_))));
}
