//! Sample dumps covering the shapes seen in real AMISCE exports.

/// Option and value questions, LF line endings, no CRC markers.
pub const BASIC: &str = "\
// Script File Name : nvram.txt
// Created on 10/19/2026 at 09:12

Setup Question\t= Fast Boot
Help String\t= Enables or disables boot with initialization of a minimal set of devices.
Token\t=12\t// Do NOT change this line
Offset\t=0
Width\t=01
BIOS Default =[00]Enabled
Options\t=*[00]Enabled\t// Move \"*\" to the desired Option
         [01]Disabled

Setup Question\t= Power Limit
Help String\t= Package power limit in watts.
Token\t=2A\t// Do NOT change this line
Min\t= 0
Max\t= 200
Value\t=<100>

Setup Question\t= Asset Tag
Token\t=30\t// Do NOT change this line
Value\t=\"ABC-123\"
";

/// Two questions with the same name told apart by token.
pub const DUPLICATE_NAMES: &str = "\
Setup Question = PCIe Port
Token = 0x1
Options =*[00]Auto
         [01]Gen1
         [02]Gen2

Setup Question = PCIe Port
Token = 0x2
Options =*[00]Auto
         [01]Gen1
         [02]Gen2

Setup Question = PCIe Port Link Speed
Token = 0x3
Options =*[00]Auto
         [01]Gen3
";

/// CRLF line endings, a file CRC header and a per-block CRC marker.
pub const GUARDED_CRLF: &str = "HIICrc32= 4C3A8D3E\r\n\
\r\n\
Setup Question\t= Secure Boot\r\n\
Help String\t= Secure Boot is activated when the platform key is enrolled.\r\n\
Token\t=5\t// Do NOT change this line\r\n\
HIICrc32=AABBCCDD,ver=02\r\n\
Options\t=*[00]Disabled\t// Move \"*\" to the desired Option\r\n\
\x20        [01]Enabled\r\n\
\r\n\
Setup Question\t= Boot Delay\r\n\
Token\t=6\t// Do NOT change this line\r\n\
Min\t= 0x0\r\n\
Max\t= 0xFF\r\n\
Value\t=<0x0A>\r\n";
