// SPDX-FileCopyrightText: 2023 Linutronix GmbH
//
// SPDX-License-Identifier: GPL-3.0-or-later
//
// Only for writing convenient doctests

use tempfile::NamedTempFile;
pub fn generate_example_yaml() -> NamedTempFile {
    use std::io::BufWriter;
    use std::io::Write;

    let file = NamedTempFile::new().expect("Unable to create named temporary file");

    {
        let mut f = BufWriter::new(&file);
        let data = concat!(
            "servers:\n",
            "  - name: server1\n",
            "    port: 56666\n",
            "    services: [GNMI, GNOI]\n",
            "    vrf: global-vrf\n",
            "unconfig:\n",
            "  - server_name: server1\n",
            "    delete_port: 56666\n",
            "expectations:\n",
            "  server1:\n",
            "    brief:\n",
            "      name: server1\n",
            "      status: En\n",
            "      port: \"56666\"\n",
            "      services: [GNMI, GNOI]\n",
            "      vrf: global-vrf\n"
        );
        f.write_all(data.as_bytes()).expect("Unable to write data");
        f.flush().expect("Flush failed");
    }

    file
}
