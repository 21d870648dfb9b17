use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};
use pnet::packet::{
    ethernet::{EtherType, EtherTypes, MutableEthernetPacket},
    ip::IpNextHeaderProtocols,
    ipv4::{self, MutableIpv4Packet},
    ipv6::MutableIpv6Packet,
    udp::{self, MutableUdpPacket},
};

use bier_wire::{proto, ETHERTYPE_BIER, HEADER_LEN};

use crate::GeneratorConfig;

const ETHERNET_HEADER_LEN: usize = 14;
const IPV4_HEADER_LEN: usize = 20;
const IPV6_HEADER_LEN: usize = 40;
const UDP_HEADER_LEN: usize = 8;

/// Assembles one fully serialized frame for the given destination.
///
/// With a BIER template configured the layout is
/// `Ethernet(0xAB37) + BIER + IP + UDP + payload`, otherwise
/// `Ethernet(0x0800 | 0x86DD) + IP + UDP + payload`. Pure: no side effects,
/// a fresh buffer per call.
pub fn build_frame(config: &GeneratorConfig, dest: IpAddr) -> Result<Bytes, bier_wire::Error> {
    let ip = match dest {
        IpAddr::V4(dst) => build_ipv4(config, dst),
        IpAddr::V6(dst) => build_ipv6(config, dst),
    };

    let bier_len = config.bier.map_or(0, |_| HEADER_LEN);
    let mut frame = BytesMut::with_capacity(ETHERNET_HEADER_LEN + bier_len + ip.len());

    let ethertype = match (config.bier.is_some(), dest) {
        (true, _) => EtherType::new(ETHERTYPE_BIER),
        (false, IpAddr::V4(_)) => EtherTypes::Ipv4,
        (false, IpAddr::V6(_)) => EtherTypes::Ipv6,
    };

    let mut eth_buf = [0u8; ETHERNET_HEADER_LEN];
    {
        let mut eth =
            MutableEthernetPacket::new(&mut eth_buf).expect("buffer fits an Ethernet header");
        eth.set_destination(config.dst_mac);
        eth.set_source(config.src_mac);
        eth.set_ethertype(ethertype);
    }
    frame.put_slice(&eth_buf);

    if let Some(template) = config.bier {
        let mut header = template;
        header.proto = match dest {
            IpAddr::V4(_) => proto::IPV4,
            IpAddr::V6(_) => proto::IPV6,
        };
        header.encode_into(&mut frame)?;
    }

    frame.put_slice(&ip);

    Ok(frame.freeze())
}

fn build_ipv4(config: &GeneratorConfig, dst: Ipv4Addr) -> Vec<u8> {
    let total = IPV4_HEADER_LEN + UDP_HEADER_LEN + config.payload.len();
    let mut buf = vec![0u8; total];

    {
        let mut udp =
            MutableUdpPacket::new(&mut buf[IPV4_HEADER_LEN..]).expect("buffer fits a UDP datagram");
        udp.set_source(config.src_port);
        udp.set_destination(config.dst_port);
        udp.set_length((UDP_HEADER_LEN + config.payload.len()) as u16);
        udp.set_payload(&config.payload);

        let checksum = udp::ipv4_checksum(&udp.to_immutable(), &config.src_ipv4, &dst);
        udp.set_checksum(checksum);
    }

    {
        let mut ip = MutableIpv4Packet::new(&mut buf).expect("buffer fits an IPv4 header");
        ip.set_version(4);
        ip.set_header_length(5);
        ip.set_dscp(0);
        ip.set_ecn(0);
        ip.set_total_length(total as u16);
        ip.set_identification(1);
        ip.set_flags(0);
        ip.set_fragment_offset(0);
        ip.set_ttl(config.ip_ttl);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Udp);
        ip.set_source(config.src_ipv4);
        ip.set_destination(dst);

        let checksum = ipv4::checksum(&ip.to_immutable());
        ip.set_checksum(checksum);
    }

    buf
}

fn build_ipv6(config: &GeneratorConfig, dst: Ipv6Addr) -> Vec<u8> {
    let total = IPV6_HEADER_LEN + UDP_HEADER_LEN + config.payload.len();
    let mut buf = vec![0u8; total];

    {
        let mut udp =
            MutableUdpPacket::new(&mut buf[IPV6_HEADER_LEN..]).expect("buffer fits a UDP datagram");
        udp.set_source(config.src_port);
        udp.set_destination(config.dst_port);
        udp.set_length((UDP_HEADER_LEN + config.payload.len()) as u16);
        udp.set_payload(&config.payload);

        let checksum = udp::ipv6_checksum(&udp.to_immutable(), &config.src_ipv6, &dst);
        udp.set_checksum(checksum);
    }

    {
        let mut ip = MutableIpv6Packet::new(&mut buf).expect("buffer fits an IPv6 header");
        ip.set_version(6);
        ip.set_traffic_class(0);
        ip.set_flow_label(0);
        ip.set_payload_length((UDP_HEADER_LEN + config.payload.len()) as u16);
        ip.set_next_header(IpNextHeaderProtocols::Udp);
        ip.set_hop_limit(config.ip_ttl);
        ip.set_source(config.src_ipv6);
        ip.set_destination(dst);
    }

    buf
}
