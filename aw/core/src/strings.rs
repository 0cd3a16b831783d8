//! Text shown by the `print` opcode, keyed by string id.

use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    pub fn table(self) -> &'static [(u16, &'static str)] {
        match self {
            Self::English => ENGLISH,
            Self::French => FRENCH,
        }
    }

    /// First entry with `id`; some ids appear twice and the later copy is never shown.
    pub fn lookup(self, id: u16) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(entry, _)| *entry == id)
            .map(|(_, text)| *text)
    }
}

pub const ENGLISH: &[(u16, &str)] = &[
    (0x0001, "P E A N U T  3000"),
    (0x0002, "Copyright  } 1990 Peanut Computer, Inc.\nAll rights reserved.\n\nCDOS Version 5.01"),
    (0x0003, "2"),
    (0x0004, "3"),
    (0x0005, "."),
    (0x0006, "A"),
    (0x0007, "@"),
    (0x0008, "PEANUT 3000"),
    (0x000A, "R"),
    (0x000B, "U"),
    (0x000C, "N"),
    (0x000D, "P"),
    (0x000E, "R"),
    (0x000F, "O"),
    (0x0010, "J"),
    (0x0011, "E"),
    (0x0012, "C"),
    (0x0013, "T"),
    (0x0014, "Shield 9A.5f Ok"),
    (0x0015, "Flux % 5.0177 Ok"),
    (0x0016, "CDI Vector ok"),
    (0x0017, " %%%ddd ok"),
    (0x0018, "Race-Track ok"),
    (0x0019, "SYNCHROTRON"),
    (0x001A, "E: 23%\ng: .005\n\nRK: 77.2L\n\nopt: g+\n\n Shield:\n1: OFF\n2: ON\n3: ON\n\nP~: 1\n"),
    (0x001B, "ON"),
    (0x001C, "-"),
    (0x0021, "|"),
    (0x0022, "--- Theoretical study ---"),
    (0x0023, " THE EXPERIMENT WILL BEGIN IN    SECONDS"),
    (0x0024, "  20"),
    (0x0025, "  19"),
    (0x0026, "  18"),
    (0x0027, "  4"),
    (0x0028, "  3"),
    (0x0029, "  2"),
    (0x002A, "  1"),
    (0x002B, "  0"),
    (0x002C, "L E T ' S   G O"),
    (0x0031, "- Phase 0:\nINJECTION of particles\ninto synchrotron"),
    (0x0032, "- Phase 1:\nParticle ACCELERATION."),
    (0x0033, "- Phase 2:\nEJECTION of particles\non the shield."),
    (0x0034, "A  N  A  L  Y  S  I  S"),
    (0x0035, "- RESULT:\nProbability of creating:\n ANTIMATTER: 91.V %\n NEUTRINO 27:  0.04 %\n NEUTRINO 424: 18 %\n"),
    (0x0036, "   Practical verification Y/N ?"),
    (0x0037, "SURE ?"),
    (0x0038, "MODIFICATION OF PARAMETERS\nRELATING TO PARTICLE\nACCELERATOR (SYNCHROTRON)."),
    (0x0039, "       RUN EXPERIMENT ?"),
    (0x003C, "t---t"),
    (0x003D, "000 ~"),
    (0x003E, ".20x14dd"),
    (0x003F, "gj5r5r"),
    (0x0040, "tilgor 25%"),
    (0x0041, "12% 33% checked"),
    (0x0042, "D=4.2158005584"),
    (0x0043, "d=10.00001"),
    (0x0044, "+"),
    (0x0045, "*"),
    (0x0046, "% 304"),
    (0x0047, "gurgle 21"),
    (0x0048, "{{{{"),
    (0x0049, "Delphine Software"),
    (0x004A, "By Eric Chahi"),
    (0x004B, "  5"),
    (0x004C, "  17"),
    (0x012C, "0"),
    (0x012D, "1"),
    (0x012E, "2"),
    (0x012F, "3"),
    (0x0130, "4"),
    (0x0131, "5"),
    (0x0132, "6"),
    (0x0133, "7"),
    (0x0134, "8"),
    (0x0135, "9"),
    (0x0136, "A"),
    (0x0137, "B"),
    (0x0138, "C"),
    (0x0139, "D"),
    (0x013A, "E"),
    (0x013B, "F"),
    (0x013C, "        ACCESS CODE:"),
    (0x013D, "PRESS BUTTON OR RETURN TO CONTINUE"),
    (0x013E, "   ENTER ACCESS CODE"),
    (0x013F, "   INVALID PASSWORD !"),
    (0x0140, "ANNULER"),
    (0x0141, "      INSERT DISK ?\n\n\n\n\n\n\n\n\nPRESS ANY KEY TO CONTINUE"),
    (0x0142, " SELECT SYMBOLS CORRESPONDING TO\n THE POSITION\n ON THE CODE WHEEL"),
    (0x0143, "    LOADING..."),
    (0x0144, "              ERROR"),
    (0x015E, "LDKD"),
    (0x015F, "HTDC"),
    (0x0160, "CLLD"),
    (0x0161, "FXLC"),
    (0x0162, "KRFK"),
    (0x0163, "XDDJ"),
    (0x0164, "LBKG"),
    (0x0165, "KLFB"),
    (0x0166, "TTCT"),
    (0x0167, "DDRX"),
    (0x0168, "TBHK"),
    (0x0169, "BRTD"),
    (0x016A, "CKJL"),
    (0x016B, "LFCK"),
    (0x016C, "BFLX"),
    (0x016D, "XJRT"),
    (0x016E, "HRTB"),
    (0x016F, "HBHK"),
    (0x0170, "JCGB"),
    (0x0171, "HHFL"),
    (0x0172, "TFBB"),
    (0x0173, "TXHF"),
    (0x0174, "JHJL"),
    (0x0181, " BY"),
    (0x0182, "ERIC CHAHI"),
    (0x0183, "         MUSIC AND SOUND EFFECTS"),
    (0x0184, " "),
    (0x0185, "JEAN-FRANCOIS FREITAS"),
    (0x0186, "IBM PC VERSION"),
    (0x0187, "      BY"),
    (0x0188, " DANIEL MORAIS"),
    (0x018B, "       THEN PRESS FIRE"),
    (0x018C, " PUT THE PADDLE ON THE UPPER LEFT CORNER"),
    (0x018D, "PUT THE PADDLE IN CENTRAL POSITION"),
    (0x018E, "PUT THE PADDLE ON THE LOWER RIGHT CORNER"),
    (0x0258, "      Designed by ..... Eric Chahi"),
    (0x0259, "    Programmed by...... Eric Chahi"),
    (0x025A, "      Artwork ......... Eric Chahi"),
    (0x025B, "Music by ........ Jean-francois Freitas"),
    (0x025C, "            Sound effects"),
    (0x025D, "        Jean-Francois Freitas\n             Eric Chahi"),
    (0x0263, "              Thanks To"),
    (0x0264, "           Jesus Martinez\n\n          Daniel Morais\n\n        Frederic Savoir\n\n      Cecile Chahi\n\n    Philippe Delamarre\n\n  Philippe Ulrich\n\nSebastien Berthet\n\nPierre Gousseau"),
    (0x0265, "Now Go Out Of This World"),
    (0x0190, "Good evening professor."),
    (0x0191, "I see you have driven here in your\nFerrari."),
    (0x0192, "IDENTIFICATION"),
    (0x0193, "Monsieur est en parfaite sante."),
    (0x0194, "Y\n"),
    (0x0193, "AU BOULOT !!!\n"),
];

pub const FRENCH: &[(u16, &str)] = &[
    (0x0001, "P E A N U T  3000"),
    (0x0002, "Copyright  } 1990 Peanut Computer, Inc.\nAll rights reserved.\n\nCDOS Version 5.01"),
    (0x0003, "2"),
    (0x0004, "3"),
    (0x0005, "."),
    (0x0006, "A"),
    (0x0007, "@"),
    (0x0008, "PEANUT 3000"),
    (0x000A, "R"),
    (0x000B, "U"),
    (0x000C, "N"),
    (0x000D, "P"),
    (0x000E, "R"),
    (0x000F, "O"),
    (0x0010, "J"),
    (0x0011, "E"),
    (0x0012, "C"),
    (0x0013, "T"),
    (0x0014, "Shield 9A.5f Ok"),
    (0x0015, "Flux % 5.0177 Ok"),
    (0x0016, "CDI Vector ok"),
    (0x0017, " %%%ddd ok"),
    (0x0018, "Race-Track ok"),
    (0x0019, "SYNCHROTRON"),
    (0x001A, "E: 23%\ng: .005\n\nRK: 77.2L\n\nopt: g+\n\n Shield:\n1: OFF\n2: ON\n3: ON\n\nP~: 1\n"),
    (0x001B, "ON"),
    (0x001C, "-"),
    (0x0021, "|"),
    (0x0022, "--- Etude theorique ---"),
    (0x0023, " L'EXPERIENCE DEBUTERA DANS    SECONDES."),
    (0x0024, "20"),
    (0x0025, "19"),
    (0x0026, "18"),
    (0x0027, "4"),
    (0x0028, "3"),
    (0x0029, "2"),
    (0x002A, "1"),
    (0x002B, "0"),
    (0x002C, "L E T ' S   G O"),
    (0x0031, "- Phase 0:\nINJECTION des particules\ndans le synchrotron"),
    (0x0032, "- Phase 1:\nACCELERATION des particules."),
    (0x0033, "- Phase 2:\nEJECTION des particules\nsur le bouclier."),
    (0x0034, "A  N  A  L  Y  S  E"),
    (0x0035, "- RESULTAT:\nProbabilites de creer de:\n ANTI-MATIERE: 91.V %\n NEUTRINO 27:  0.04 %\n NEUTRINO 424: 18 %\n"),
    (0x0036, "Verification par la pratique O/N ?"),
    (0x0037, "SUR ?"),
    (0x0038, "MODIFICATION DES PARAMETRES\nRELATIFS A L'ACCELERATEUR\nDE PARTICULES (SYNCHROTRON)."),
    (0x0039, "SIMULATION DE L'EXPERIENCE ?"),
    (0x003C, "t---t"),
    (0x003D, "000 ~"),
    (0x003E, ".20x14dd"),
    (0x003F, "gj5r5r"),
    (0x0040, "tilgor 25%"),
    (0x0041, "12% 33% checked"),
    (0x0042, "D=4.2158005584"),
    (0x0043, "d=10.00001"),
    (0x0044, "+"),
    (0x0045, "*"),
    (0x0046, "% 304"),
    (0x0047, "gurgle 21"),
    (0x0048, "{{{{"),
    (0x0049, "Delphine Software"),
    (0x004A, "By Eric Chahi"),
    (0x004B, "5"),
    (0x004C, "17"),
    (0x012C, "0"),
    (0x012D, "1"),
    (0x012E, "2"),
    (0x012F, "3"),
    (0x0130, "4"),
    (0x0131, "5"),
    (0x0132, "6"),
    (0x0133, "7"),
    (0x0134, "8"),
    (0x0135, "9"),
    (0x0136, "A"),
    (0x0137, "B"),
    (0x0138, "C"),
    (0x0139, "D"),
    (0x013A, "E"),
    (0x013B, "F"),
    (0x013C, "       CODE D'ACCES:"),
    (0x013D, "PRESSEZ LE BOUTON POUR CONTINUER"),
    (0x013E, "   ENTRER LE CODE D'ACCES"),
    (0x013F, "MOT DE PASSE INVALIDE !"),
    (0x0140, "ANNULER"),
    (0x0141, "     INSEREZ LA DISQUETTE ?\n\n\n\n\n\n\n\n\nPRESSEZ UNE TOUCHE POUR CONTINUER"),
    (0x0142, "SELECTIONNER LES SYMBOLES CORRESPONDANTS\nA LA POSITION\nDE LA ROUE DE PROTECTION"),
    (0x0143, "CHARGEMENT..."),
    (0x0144, "             ERREUR"),
    (0x015E, "LDKD"),
    (0x015F, "HTDC"),
    (0x0160, "CLLD"),
    (0x0161, "FXLC"),
    (0x0162, "KRFK"),
    (0x0163, "XDDJ"),
    (0x0164, "LBKG"),
    (0x0165, "KLFB"),
    (0x0166, "TTCT"),
    (0x0167, "DDRX"),
    (0x0168, "TBHK"),
    (0x0169, "BRTD"),
    (0x016A, "CKJL"),
    (0x016B, "LFCK"),
    (0x016C, "BFLX"),
    (0x016D, "XJRT"),
    (0x016E, "HRTB"),
    (0x016F, "HBHK"),
    (0x0170, "JCGB"),
    (0x0171, "HHFL"),
    (0x0172, "TFBB"),
    (0x0173, "TXHF"),
    (0x0174, "JHJL"),
    (0x0181, "PAR"),
    (0x0182, "ERIC CHAHI"),
    (0x0183, "          MUSIQUES ET BRUITAGES"),
    (0x0184, "DE"),
    (0x0185, "JEAN-FRANCOIS FREITAS"),
    (0x0186, "VERSION IBM PC"),
    (0x0187, "      PAR"),
    (0x0188, " DANIEL MORAIS"),
    (0x018B, "PUIS PRESSER LE BOUTON"),
    (0x018C, "POSITIONNER LE JOYSTICK EN HAUT A GAUCHE"),
    (0x018D, " POSITIONNER LE JOYSTICK AU CENTRE"),
    (0x018E, " POSITIONNER LE JOYSTICK EN BAS A DROITE"),
    (0x0258, "       Conception ..... Eric Chahi"),
    (0x0259, "    Programmation ..... Eric Chahi"),
    (0x025A, "     Graphismes ....... Eric Chahi"),
    (0x025B, "Musique de ...... Jean-francois Freitas"),
    (0x025C, "              Bruitages"),
    (0x025D, "        Jean-Francois Freitas\n             Eric Chahi"),
    (0x0263, "               Merci a"),
    (0x0264, "           Jesus Martinez\n\n          Daniel Morais\n\n        Frederic Savoir\n\n      Cecile Chahi\n\n    Philippe Delamarre\n\n  Philippe Ulrich\n\nSebastien Berthet\n\nPierre Gousseau"),
    (0x0265, "Now Go Back To Another Earth"),
    (0x0190, "Bonsoir professeur."),
    (0x0191, "Je vois que Monsieur a pris\nsa Ferrari."),
    (0x0192, "IDENTIFICATION"),
    (0x0193, "Monsieur est en parfaite sante."),
    (0x0194, "O\n"),
    (0x0193, "AU BOULOT !!!\n"),
];
