use riscv_core::core::arch::PrivilegeMode;

#[test]
fn numeric_encoding_matches_the_privileged_spec() {
    assert_eq!(PrivilegeMode::User.to_u8(), 0);
    assert_eq!(PrivilegeMode::Supervisor.to_u8(), 1);
    assert_eq!(PrivilegeMode::Machine.to_u8(), 3);
}

#[test]
fn from_u8_round_trips_valid_encodings() {
    for mode in [PrivilegeMode::User, PrivilegeMode::Supervisor, PrivilegeMode::Machine] {
        assert_eq!(PrivilegeMode::from_u8(mode.to_u8()), mode);
    }
}

#[test]
fn from_u8_falls_back_to_machine_for_the_reserved_hypervisor_encoding() {
    assert_eq!(PrivilegeMode::from_u8(2), PrivilegeMode::Machine);
}

#[test]
fn ordering_reflects_privilege_ranking() {
    assert!(PrivilegeMode::User < PrivilegeMode::Supervisor);
    assert!(PrivilegeMode::Supervisor < PrivilegeMode::Machine);
}

#[test]
fn display_renders_the_mode_name() {
    assert_eq!(format!("{}", PrivilegeMode::Supervisor), "Supervisor");
}
