// Licensed under the Apache-2.0 license

//! Tests for the bridge generator and its cycle model.

mod test {
    use super::super::model::{BridgeModel, BusDriver, LbRequest};
    use super::super::protocol::{Phase, PROTOCOLS};
    use super::super::{build_model, render_bridge};
    use crate::config::Configuration;
    use crate::layout::resolve;
    use crate::model::{Access, BitField, Modifier, Register, RegisterMap};

    fn config(bridge: &str) -> Configuration {
        Configuration::new().with("lb_bridge.type", bridge).unwrap()
    }

    fn field(name: &str, lsb: u32, width: u32, access: Access, modifiers: &[Modifier]) -> BitField {
        BitField::new(name, lsb, width, access)
            .unwrap()
            .with_modifiers(modifiers.iter().copied())
            .unwrap()
    }

    /// One register per field template, at 0x0, 0x4, ...
    fn behaviors(config: Configuration) -> RegisterMap {
        let mut rmap = RegisterMap::new(config);
        let regs = [
            ("ctrl", field("mode", 0, 8, Access::ReadWrite, &[])),
            ("status", field("level", 4, 4, Access::ReadOnly, &[])),
            ("irq", field("pending", 0, 4, Access::ReadOnly, &[Modifier::ReadClear])),
            ("cmd", field("go", 0, 1, Access::WriteOnly, &[Modifier::SelfClear])),
            ("kick", field("strobe", 8, 8, Access::WriteOnly, &[Modifier::WritePulse])),
            ("key", field("value", 0, 16, Access::ReadWrite, &[Modifier::WriteOnce])),
            ("evt", field("count", 0, 8, Access::ReadWrite, &[Modifier::ReadClear])),
        ];
        for (name, bf) in regs {
            rmap.add_register(Register::new(name).unwrap().with_bitfield(bf).unwrap())
                .unwrap();
        }
        rmap
    }

    fn with_model<T>(rmap: &RegisterMap, f: impl FnOnce(&mut BridgeModel, BusDriver) -> T) -> T {
        let resolved = resolve(rmap).unwrap();
        let (mut model, driver) = build_model(&resolved).unwrap().unwrap();
        f(&mut model, driver)
    }

    #[test]
    fn test_scenario_decodes_both_registers() {
        let rmap = RegisterMap::template(config("apb")).unwrap();
        let resolved = resolve(&rmap).unwrap();
        let bridge = render_bridge(&resolved, "regs").unwrap().unwrap();
        assert_eq!(bridge.file_name, "apb2lb_regs.v");
        let text = &bridge.text;
        println!("{text}");
        assert!(text.contains("module apb2lb_regs ("));
        assert!(text.contains("wire spam_wsel = lb_wen & (lb_waddr == 16'h0000);"));
        assert!(text.contains("wire eggs_rsel = lb_ren & (lb_raddr == 16'h0004);"));
        assert!(text.contains("output wire [6:0]   csr_spam_foo_out"));
        assert!(text.contains("input  wire [15:0]  csr_eggs_baz_in"));
        assert!(text.contains("spam_foo_ff <= 7'h2a;"));
        assert!(text.contains("16'h0000: lb_rdata <= {25'h000_0000, spam_foo_ff};"));
        assert!(text.contains("16'h0004: lb_rdata <= {csr_eggs_baz_in, 16'h0000};"));
        assert!(text.contains("localparam SC_IDLE = 1'b0;"));
        assert!(!text.contains("WO_OPEN"));
        assert!(text.trim_end().ends_with("endmodule"));

        let driver = BusDriver::new(bridge.protocol);
        let (mut model, _) = build_model(&resolved).unwrap().unwrap();
        model.set_input("eggs", "baz", 0xbeef);
        assert_eq!(driver.read(&mut model, 0).data, Some(42));
        assert_eq!(driver.read(&mut model, 4).data, Some(0xbeef_0000));
        driver.write(&mut model, 0, 0x7f);
        assert_eq!(model.output("spam", "foo"), Some(0x7f));
        assert_eq!(driver.read(&mut model, 4).data, Some(0xbeef_0000));
    }

    #[test]
    fn test_none_skips() {
        let rmap = RegisterMap::template(Configuration::new()).unwrap();
        let resolved = resolve(&rmap).unwrap();
        assert!(render_bridge(&resolved, "regs").unwrap().is_none());
        assert!(build_model(&resolved).unwrap().is_none());
    }

    #[test]
    fn test_width_mismatch() {
        let rmap = RegisterMap::template(config("apb")).unwrap();
        let mut resolved = resolve(&rmap).unwrap();
        resolved.data_width = 16;
        assert!(render_bridge(&resolved, "regs").unwrap_err().is_conflict());
        assert!(build_model(&resolved).unwrap_err().is_conflict());
    }

    #[test]
    fn test_unsupported_data_width() {
        let config = config("apb").with("data_width", 64).unwrap();
        let rmap = RegisterMap::new(config);
        let resolved = resolve(&rmap).unwrap();
        let err = render_bridge(&resolved, "regs").unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("64-bit"));

        let config = Configuration::new()
            .with("lb_bridge.type", "axil")
            .unwrap()
            .with("data_width", 16)
            .unwrap();
        let rmap = RegisterMap::new(config);
        let resolved = resolve(&rmap).unwrap();
        assert!(render_bridge(&resolved, "regs").unwrap_err().is_conflict());
    }

    #[test]
    fn test_increment_smaller_than_bus() {
        let config = config("amm").with("address_increment", 2).unwrap();
        let rmap = RegisterMap::new(config);
        let resolved = resolve(&rmap).unwrap();
        assert!(render_bridge(&resolved, "regs").unwrap_err().is_conflict());
    }

    #[test]
    fn test_filler_too_wide() {
        let config = config("amm")
            .with("data_width", 8)
            .unwrap()
            .with("read_filler", 0x100)
            .unwrap();
        let rmap = RegisterMap::new(config);
        let resolved = resolve(&rmap).unwrap();
        assert!(render_bridge(&resolved, "regs").unwrap_err().is_config());
    }

    #[test]
    fn test_bad_module_name() {
        let rmap = RegisterMap::template(config("apb")).unwrap();
        let resolved = resolve(&rmap).unwrap();
        assert!(render_bridge(&resolved, "my-regs").unwrap_err().is_config());
    }

    #[test]
    fn test_signal_collision() {
        let mut rmap = RegisterMap::new(config("apb"));
        let a = Register::new("a_b")
            .unwrap()
            .with_bitfield(field("c", 0, 1, Access::ReadWrite, &[]))
            .unwrap();
        let b = Register::new("a")
            .unwrap()
            .with_bitfield(field("b_c", 0, 1, Access::ReadWrite, &[]))
            .unwrap();
        rmap.add_registers([a, b]).unwrap();
        let resolved = resolve(&rmap).unwrap();
        let err = render_bridge(&resolved, "regs").unwrap_err();
        assert!(err.is_conflict());
        assert!(err.to_string().contains("a_b_c"), "{err}");
    }

    #[test]
    fn test_self_clear_holds_one_cycle() {
        let rmap = RegisterMap::template(config("apb")).unwrap();
        with_model(&rmap, |model, _| {
            let write = LbRequest::Write {
                addr: 0,
                data: 1 << 24,
                strobe: 0xf,
            };
            let trace: Vec<u64> = [write, LbRequest::Idle, LbRequest::Idle, LbRequest::Idle]
                .into_iter()
                .map(|req| model.cycle(req).output("spam", "bar").unwrap())
                .collect();
            assert_eq!(trace, [0, 1, 0, 0]);
        });
    }

    #[test]
    fn test_self_clear_drops_back_to_back_write() {
        let rmap = behaviors(config("amm"));
        with_model(&rmap, |model, _| {
            let write = LbRequest::Write {
                addr: 0xc,
                data: 1,
                strobe: 0xf,
            };
            let trace: Vec<u64> = [write, write, write, LbRequest::Idle]
                .into_iter()
                .map(|req| model.cycle(req).output("cmd", "go").unwrap())
                .collect();
            // Asserted, dropped while asserted, accepted again from idle.
            assert_eq!(trace, [0, 1, 0, 1]);
        });
    }

    #[test]
    fn test_write_pulse() {
        let rmap = behaviors(config("amm"));
        with_model(&rmap, |model, driver| {
            let tx = driver.write(model, 0x10, 0xa5 << 8);
            assert_eq!(tx.cycles.len(), 1);
            assert_eq!(tx.cycles[0].output("kick", "strobe"), Some(0xa5));
            assert_eq!(model.cycle(LbRequest::Idle).output("kick", "strobe"), Some(0));
            // Pulses read back as filler.
            assert_eq!(driver.read(model, 0x10).data, Some(0));
        });
    }

    #[test]
    fn test_write_once_locks_until_reset() {
        let rmap = behaviors(config("axil"));
        with_model(&rmap, |model, driver| {
            driver.write(model, 0x14, 0x1234);
            driver.write(model, 0x14, 0xffff);
            assert_eq!(model.output("key", "value"), Some(0x1234));
            assert_eq!(driver.read(model, 0x14).data, Some(0x1234));
            model.reset();
            driver.write(model, 0x14, 0xffff);
            assert_eq!(model.output("key", "value"), Some(0xffff));
        });
    }

    #[test]
    fn test_read_clear() {
        let rmap = behaviors(config("apb"));
        with_model(&rmap, |model, driver| {
            driver.write(model, 0x18, 0x42);
            assert_eq!(driver.read(model, 0x18).data, Some(0x42));
            assert_eq!(driver.read(model, 0x18).data, Some(0));
        });
    }

    #[test]
    fn test_write_beats_read_clear() {
        let rmap = behaviors(config("axil"));
        with_model(&rmap, |model, driver| {
            driver.write(model, 0x18, 0x42);
            let both = LbRequest::WriteRead {
                waddr: 0x18,
                data: 0x17,
                strobe: 0xf,
                raddr: 0x18,
            };
            model.cycle(both);
            // The read returns the value from before the edge.
            let trace = model.cycle(LbRequest::Idle);
            assert!(trace.rvalid);
            assert_eq!(trace.rdata, 0x42);
            // The write is kept, the clear is skipped.
            assert_eq!(model.output("evt", "count"), Some(0x17));
            assert_eq!(driver.read(model, 0x18).data, Some(0x17));
            assert_eq!(driver.read(model, 0x18).data, Some(0));
        });
    }

    #[test]
    fn test_write_and_read_of_different_registers() {
        let rmap = behaviors(config("axil"));
        with_model(&rmap, |model, driver| {
            driver.write(model, 0x18, 0x42);
            let both = LbRequest::WriteRead {
                waddr: 0x0,
                data: 0x5,
                strobe: 0xf,
                raddr: 0x18,
            };
            model.cycle(both);
            assert_eq!(model.cycle(LbRequest::Idle).rdata, 0x42);
            assert_eq!(model.output("ctrl", "mode"), Some(0x5));
            assert_eq!(model.output("evt", "count"), Some(0));
        });
    }

    #[test]
    fn test_sticky_input() {
        let rmap = behaviors(config("apb"));
        with_model(&rmap, |model, driver| {
            model.set_input("irq", "pending", 0b0001);
            model.cycle(LbRequest::Idle);
            model.set_input("irq", "pending", 0b0100);
            model.cycle(LbRequest::Idle);
            model.set_input("irq", "pending", 0);
            assert_eq!(driver.read(model, 0x8).data, Some(0b0101));
            assert_eq!(driver.read(model, 0x8).data, Some(0));
            assert!(!model.set_input("ctrl", "mode", 1));
        });
    }

    #[test]
    fn test_hw_driven_and_filler() {
        let config = config("apb").with("read_filler", 0xdead_beef_u64).unwrap();
        let rmap = behaviors(config);
        with_model(&rmap, |model, driver| {
            model.set_input("status", "level", 0x9);
            assert_eq!(driver.read(model, 0x4).data, Some(0xdead_be9f));
            // Write-only positions read as filler.
            assert_eq!(driver.read(model, 0xc).data, Some(0xdead_beef));
            // Unmapped address.
            assert_eq!(driver.read(model, 0x40).data, Some(0xdead_beef));
            driver.write(model, 0x40, 0x1);
            assert_eq!(model.output("ctrl", "mode"), Some(0));
        });
    }

    #[test]
    fn test_byte_strobes() {
        let config = config("axil").with("data_width", 32).unwrap();
        let mut rmap = RegisterMap::new(config);
        let reg = Register::new("data")
            .unwrap()
            .with_bitfield(field("lo", 0, 12, Access::ReadWrite, &[]))
            .unwrap()
            .with_bitfield(field("hi", 16, 16, Access::ReadWrite, &[]))
            .unwrap();
        rmap.add_register(reg).unwrap();
        with_model(&rmap, |model, driver| {
            driver.write(model, 0, 0xffff_ffff);
            driver.write_strobed(model, 0, 0x0000_0000, 0b0010);
            assert_eq!(model.output("data", "lo"), Some(0x0ff));
            assert_eq!(model.output("data", "hi"), Some(0xffff));
            driver.write_strobed(model, 0, 0x1200_0000, 0b1000);
            assert_eq!(model.output("data", "hi"), Some(0x12ff));
        });
    }

    #[test]
    fn test_phase_timing() {
        for protocol in PROTOCOLS {
            let rmap = RegisterMap::template(config(protocol.name)).unwrap();
            with_model(&rmap, |model, _| {
                let driver = BusDriver::new(protocol);
                let write = driver.write(model, 0, 5);
                let expected = match protocol.name {
                    "amm" => 1,
                    _ => 2,
                };
                assert_eq!(write.cycles.len(), expected, "{}", protocol.name);
                let read = driver.read(model, 0);
                assert_eq!(read.cycles.len(), protocol.read_phases.len(), "{}", protocol.name);
                assert_eq!(read.data, Some(5), "{}", protocol.name);
                // The strobe cycle never carries the response.
                let strobe = protocol
                    .read_phases
                    .iter()
                    .position(|p| *p == Phase::Strobe)
                    .unwrap();
                assert!(!read.cycles[strobe].rvalid, "{}", protocol.name);
            });
        }
    }

    #[test]
    fn test_front_ends_and_reset_styles() {
        for protocol in PROTOCOLS {
            for reset in ["sync_pos", "sync_neg", "async_pos", "async_neg"] {
                let config = config(protocol.name).with("register_reset", reset).unwrap();
                let rmap = behaviors(config);
                let resolved = resolve(&rmap).unwrap();
                let text = render_bridge(&resolved, "bank").unwrap().unwrap().text;
                for port in protocol.ports {
                    assert!(text.contains(port.name), "{} missing {}", protocol.name, port.name);
                }
                let style = resolved.config().register_reset();
                assert!(text.contains(&format!("always {} begin", style.sensitivity())));
                assert!(text.contains(&format!("if ({}) begin", style.active())));
                assert!(text.contains("localparam WO_LOCKED = 1'b1;"));
                assert!(text.contains("assign csr_kick_strobe_out = kick_strobe_we ?"));
                let sticky = "irq_pending_ff <= (irq_rsel ? 4'h0 : irq_pending_ff) \
                              | csr_irq_pending_in;";
                assert!(text.contains(sticky));
            }
        }
    }

    #[test]
    fn test_emitted_state_machines() {
        let rmap = behaviors(config("apb"));
        let resolved = resolve(&rmap).unwrap();
        let text = render_bridge(&resolved, "bank").unwrap().unwrap().text;

        // Self-clear: only idle accepts a write, any other state falls back.
        assert!(text.contains("case (cmd_go_state)"));
        assert!(text.contains("SC_IDLE: if (cmd_go_we) begin"));
        assert!(text.contains("cmd_go_state <= SC_ASSERTED;"));
        assert!(text.contains("default: begin"));

        // Write-once: the write is gated on the open state and locks it.
        let open = "end else if (key_value_we && key_value_state == WO_OPEN) begin";
        assert!(text.contains(open));
        assert!(text.contains("key_value_state <= WO_LOCKED;"));
        assert!(text.contains("key_value_state <= WO_OPEN;"));

        // Read-clear: the write branch comes first.
        let write = text.find("end else if (evt_count_we) begin").unwrap();
        let clear = "end else if (evt_rsel) begin\n        evt_count_ff <= 8'h00;";
        assert!(write < text.find(clear).unwrap());
    }

    #[test]
    fn test_naming_case() {
        let config = config("apb")
            .with("naming.case", "upper")
            .unwrap()
            .with("naming.prefix", "regs_")
            .unwrap();
        let rmap = RegisterMap::template(config).unwrap();
        let resolved = resolve(&rmap).unwrap();
        let text = render_bridge(&resolved, "regs").unwrap().unwrap().text;
        assert!(text.contains("REGS_SPAM_FOO_OUT"));
        assert!(text.contains("REGS_EGGS_BAZ_IN"));
    }
}
