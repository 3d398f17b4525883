//! LAN driver: JSON datagrams over UDP.
//!
//! Every request is a single datagram answered by a single datagram. A
//! session starts with a `handshake` that trades the credential pair for a
//! token; every later request carries that token in its `params`.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::UdpSocket;

use crate::device::{ColorPayload, Connector, Credentials, Device, DeviceEndpoint};
use crate::errors::Error;
use crate::status::{DeviceState, PilotReply};
use crate::types::{Brightness, DeviceKind};

type Result<T> = std::result::Result<T, Error>;

/// Default UDP port devices listen on.
pub const PORT: u16 = 38899;

/// Error code a device answers with once a token is no longer valid.
pub const SESSION_EXPIRED_CODE: i64 = -32001;

const TIMEOUT_MS: u64 = 1000;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [750, 1500, 3000];

/// Parameters of a `setPilot` request.
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Clone)]
struct PilotParams<'a> {
    token: &'a str,
    dimming: Option<u8>,
    #[serde(rename = "r")]
    red: Option<u8>,
    #[serde(rename = "g")]
    green: Option<u8>,
    #[serde(rename = "b")]
    blue: Option<u8>,
    hue: Option<u16>,
    saturation: Option<u8>,
}

/// An authenticated session to a device on the local network.
#[derive(Debug)]
pub struct Light {
    address: SocketAddr,
    kind: DeviceKind,
    token: String,
}

impl Light {
    async fn set_power_state(&self, on: bool) -> Result<()> {
        self.call("setState", json!({"state": on})).await?;
        Ok(())
    }

    async fn set_pilot(&self, params: &PilotParams<'_>) -> Result<()> {
        let params = serde_json::to_value(params).map_err(Error::JsonDump)?;
        self.call("setPilot", params).await?;
        Ok(())
    }

    async fn call(&self, method: &str, mut params: Value) -> Result<Value> {
        if let Value::Object(map) = &mut params {
            map.insert("token".to_string(), json!(self.token));
        }
        send_command(self.address, method, &json!({"method": method, "params": params})).await
    }
}

#[async_trait]
impl Device for Light {
    async fn turn_on(&self) -> Result<()> {
        self.set_power_state(true).await
    }

    async fn turn_off(&self) -> Result<()> {
        self.set_power_state(false).await
    }

    async fn set_brightness(&self, brightness: Brightness) -> Result<()> {
        self.set_pilot(&PilotParams {
            token: &self.token,
            dimming: Some(brightness.value()),
            ..Default::default()
        })
        .await
    }

    async fn set_color(&self, color: &ColorPayload) -> Result<()> {
        let params = match color {
            ColorPayload::Rgb(rgb) => PilotParams {
                token: &self.token,
                red: Some(rgb.red()),
                green: Some(rgb.green()),
                blue: Some(rgb.blue()),
                ..Default::default()
            },
            ColorPayload::Hsv(hsv) => PilotParams {
                token: &self.token,
                hue: Some(hsv.hue()),
                saturation: Some(hsv.saturation()),
                ..Default::default()
            },
        };
        self.set_pilot(&params).await
    }

    async fn get_state(&self) -> Result<DeviceState> {
        let resp = self.call("getPilot", json!({})).await?;
        let reply: PilotReply = serde_json::from_value(resp).map_err(Error::JsonLoad)?;
        Ok(match self.kind {
            DeviceKind::Switch => DeviceState::switch(reply.result.state),
            DeviceKind::Bulb => DeviceState::from(&reply.result),
        })
    }
}

/// Opens [`Light`] sessions by performing the handshake.
#[derive(Debug, Default, Clone)]
pub struct LanConnector;

#[async_trait]
impl Connector for LanConnector {
    async fn connect(
        &self,
        endpoint: &DeviceEndpoint,
        credentials: &Credentials,
    ) -> Result<Box<dyn Device>> {
        let msg = json!({
            "method": "handshake",
            "params": {
                "username": credentials.username,
                "password": credentials.password.expose_secret(),
            }
        });
        let resp = send_command(endpoint.address, "handshake", &msg).await?;
        let token = resp
            .get("result")
            .and_then(|r| r.get("token"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::UnexpectedReply("handshake reply carries no token".into()))?;

        debug!("Handshake with {} succeeded", endpoint.address);
        Ok(Box::new(Light {
            address: endpoint.address,
            kind: endpoint.kind,
            token: token.to_string(),
        }))
    }
}

/// Send a request and wait for its reply, resending on transport failures.
///
/// Error replies from the device are returned immediately; only lost or
/// unreadable datagrams are retried.
async fn send_command(address: SocketAddr, method: &str, msg: &Value) -> Result<Value> {
    let msg_str = serde_json::to_string(msg).map_err(Error::JsonDump)?;
    let mut last_error = None;

    for attempt in 0..=MAX_RETRIES {
        debug!("Sending {method} to {address} (attempt {attempt})");
        match send_udp(address, &msg_str).await {
            Ok(response) => {
                debug!("UDP response from {address}: {response:?}");
                return check_reply(response);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    let delay_idx = (attempt as usize).min(RETRY_DELAYS_MS.len() - 1);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAYS_MS[delay_idx])).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::UnexpectedReply("no reply".into())))
}

fn check_reply(response: Value) -> Result<Value> {
    let Some(err) = response.get("error") else {
        return Ok(response);
    };

    let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error");

    if code == SESSION_EXPIRED_CODE {
        Err(Error::SessionExpired(message.to_string()))
    } else {
        Err(Error::device(code, message))
    }
}

async fn send_udp(address: SocketAddr, msg: &str) -> Result<Value> {
    let local = if address.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(local)
        .await
        .map_err(|e| Error::socket("bind", e))?;

    socket
        .connect(address)
        .await
        .map_err(|e| Error::socket("connect", e))?;

    socket
        .send(msg.as_bytes())
        .await
        .map_err(|e| Error::socket("send", e))?;

    let mut buffer = [0u8; 4096];

    let bytes = tokio::time::timeout(Duration::from_millis(TIMEOUT_MS), socket.recv(&mut buffer))
        .await
        .map_err(|_| {
            Error::socket(
                "receive",
                std::io::Error::new(std::io::ErrorKind::TimedOut, "receive timeout"),
            )
        })?
        .map_err(|e| Error::socket("receive", e))?;

    let response = String::from_utf8(buffer[..bytes].to_vec()).map_err(Error::Utf8Decode)?;
    serde_json::from_str(&response).map_err(Error::JsonLoad)
}
